//! README validation collaborator (spec §9).
//!
//! Real README rendering is out of scope (spec §1 non-goals); this module
//! models the *interface* to that external collaborator
//! (`validate(readme) -> Result<(), Vec<Diagnostic>>`) and ships a
//! conservative built-in implementation rather than shelling out to a
//! renderer. Disabled entirely by setting `CHECK_README=0` (spec §6).

use std::path::Path;

use crate::error::Diagnostic;
use crate::project_config::{Readme, ReadmeSource};

/// Returns `true` unless `CHECK_README` is exactly `"0"`.
pub fn readme_check_enabled() -> bool {
    std::env::var("CHECK_README").as_deref() != Ok("0")
}

/// Conservatively checks that `readme` is renderable: the file exists and is
/// valid UTF-8, and — for `.rst` bodies — contains no obviously unterminated
/// directive block. Does not attempt real rendering.
pub fn validate(project_root: &Path, readme: &Readme) -> Result<(), Vec<Diagnostic>> {
    let body = match &readme.source {
        ReadmeSource::File(path) => {
            let absolute = project_root.join(path);
            match std::fs::read(&absolute) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        return Err(vec![Diagnostic::new(format!(
                            "project.readme file {} is not valid UTF-8",
                            path.display()
                        ))]);
                    }
                },
                Err(error) => {
                    return Err(vec![Diagnostic::new(format!(
                        "project.readme file {} could not be read: {error}",
                        path.display()
                    ))]);
                }
            }
        }
        ReadmeSource::Text(text) => text.clone(),
    };

    if readme.content_type.starts_with("text/x-rst") {
        check_rst_directives(&body)?;
    }

    Ok(())
}

/// Flags a `.. directive::` block opened at end-of-file with no body line,
/// the most common "this will not render" mistake.
fn check_rst_directives(body: &str) -> Result<(), Vec<Diagnostic>> {
    let Some(last_directive) = body
        .lines()
        .rev()
        .find(|line| line.trim_start().starts_with(".."))
    else {
        return Ok(());
    };
    if last_directive.trim_end() == body.lines().last().unwrap_or_default().trim_end() {
        return Err(vec![Diagnostic::new(
            "README ends with an unterminated reStructuredText directive block",
        )]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_config::Readme;

    fn rst_readme(text: &str) -> Readme {
        Readme {
            source: ReadmeSource::Text(text.to_string()),
            content_type: "text/x-rst".to_string(),
            charset: "UTF-8".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_text_readme() {
        let readme = Readme {
            source: ReadmeSource::Text("hello".to_string()),
            content_type: "text/plain".to_string(),
            charset: "UTF-8".to_string(),
        };
        assert!(validate(Path::new("."), &readme).is_ok());
    }

    #[test]
    fn flags_unterminated_rst_directive() {
        let readme = rst_readme("Title\n=====\n\n.. note::");
        assert!(validate(Path::new("."), &readme).is_err());
    }

    #[test]
    fn accepts_rst_directive_with_body() {
        let readme = rst_readme("Title\n=====\n\n.. note::\n\n   Some body text.\n");
        assert!(validate(Path::new("."), &readme).is_ok());
    }
}
