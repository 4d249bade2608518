//! C6: Core-Metadata emitter.
//!
//! Builds the RFC 822 `METADATA`/`PKG-INFO` document from a [`ProjectConfig`]
//! plus whatever C4 synthesized. Grounded on the teacher's old
//! `Metadata21::to_vec`/`to_file_contents`/`get_distribution_escaped` (the
//! ordered-field-list-then-join approach, and the PEP 427 escaping regex),
//! generalized from Cargo.toml-derived fields to PEP 621 ones.

use std::path::PathBuf;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::project_config::{Person, ProjectConfig, Readme, ReadmeSource};

/// Python Package Metadata 2.2, as specified at
/// <https://packaging.python.org/specifications/core-metadata/>.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub description_content_type: Option<String>,
    pub keywords: Vec<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub maintainer: Option<String>,
    pub maintainer_email: Option<String>,
    pub license: Option<String>,
    pub classifiers: Vec<String>,
    pub requires_dist: Vec<String>,
    pub requires_python: Option<String>,
    pub project_url: IndexMap<String, String>,
    pub provides_extra: Vec<String>,
}

/// Builds a [`Metadata`] document from validated project config plus
/// whatever C4 synthesized for `classifiers`/`requires-python`, and the
/// already-read readme body (if any).
pub fn build_metadata(
    project: &ProjectConfig,
    synthesized_classifiers: Option<Vec<String>>,
    synthesized_requires_python: Option<String>,
    readme_body: Option<String>,
) -> Metadata {
    let classifiers = synthesized_classifiers.unwrap_or_else(|| project.classifiers.clone());
    let requires_python = synthesized_requires_python
        .or_else(|| project.requires_python.as_ref().map(ToString::to_string));

    let (author, author_email) = format_people(&project.authors);
    let (maintainer, maintainer_email) = format_people(&project.maintainers);

    let (description, description_content_type) = match (&project.readme, readme_body) {
        (Some(readme), Some(body)) => (Some(body), Some(content_type_header(readme))),
        _ => (None, None),
    };

    let mut requires_dist: Vec<String> =
        project.dependencies.iter().map(ToString::to_string).collect();
    for (extra, reqs) in &project.optional_dependencies {
        for req in reqs {
            requires_dist.push(format_requirement_with_extra(req, extra));
        }
    }

    Metadata {
        name: project.name.clone(),
        version: project.version.to_string(),
        summary: project.description.clone(),
        description,
        description_content_type,
        keywords: project.keywords.clone(),
        author,
        author_email,
        maintainer,
        maintainer_email,
        license: license_header(project),
        classifiers,
        requires_dist,
        requires_python,
        project_url: project.urls.clone(),
        provides_extra: project.optional_dependencies.keys().cloned().collect(),
    }
}

/// Splits people into a name-only list (`Author`) and a list of entries
/// that carry an email (`Author-Email`), matching the convention used by
/// flit/hatchling.
fn format_people(people: &[Person]) -> (Option<String>, Option<String>) {
    let names: Vec<String> = people
        .iter()
        .filter(|p| p.email.is_none())
        .filter_map(|p| p.name.clone())
        .collect();
    let with_email: Vec<String> = people
        .iter()
        .filter_map(|p| match (&p.name, &p.email) {
            (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
            (None, Some(email)) => Some(email.clone()),
            _ => None,
        })
        .collect();

    let author = (!names.is_empty()).then(|| names.join(", "));
    let author_email = (!with_email.is_empty()).then(|| with_email.join(", "));
    (author, author_email)
}

/// `License` is single-line per RFC 822; a multi-line `license.text` is
/// surfaced only via the `LICENSE` file the wheel/sdist builders copy, not
/// via this header.
fn license_header(project: &ProjectConfig) -> Option<String> {
    match &project.license {
        Some(crate::project_config::LicenseRef::Text(text)) if !text.contains('\n') => {
            Some(text.clone())
        }
        _ => None,
    }
}

fn content_type_header(readme: &Readme) -> String {
    format!("{}; charset={}", readme.content_type, readme.charset)
}

/// Appends `; extra == "name"` to a requirement's marker, composed with an
/// existing marker via ` and ` (spec §4.6).
fn format_requirement_with_extra(req: &pep508_rs::Requirement, extra: &str) -> String {
    let rendered = req.to_string();
    match rendered.split_once(';') {
        Some((requirement, marker)) => {
            format!("{}; {} and extra == \"{extra}\"", requirement.trim_end(), marker.trim())
        }
        None => format!("{rendered}; extra == \"{extra}\""),
    }
}

static ESCAPE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\d.]+").unwrap());

impl Metadata {
    /// Formats the metadata as an ordered list of `(header, value)` pairs,
    /// one entry per multi-use field value, per spec §4.6.
    pub fn to_vec(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("Metadata-Version".to_string(), "2.2".to_string()),
            ("Name".to_string(), self.name.clone()),
            ("Version".to_string(), self.version.clone()),
        ];

        let mut add_option = |fields: &mut Vec<(String, String)>, name: &str, value: &Option<String>| {
            if let Some(value) = value {
                fields.push((name.to_string(), value.clone()));
            }
        };
        add_option(&mut fields, "Summary", &self.summary);
        if !self.keywords.is_empty() {
            fields.push(("Keywords".to_string(), self.keywords.join(" ")));
        }
        add_option(&mut fields, "Author", &self.author);
        add_option(&mut fields, "Author-Email", &self.author_email);
        add_option(&mut fields, "Maintainer", &self.maintainer);
        add_option(&mut fields, "Maintainer-Email", &self.maintainer_email);
        add_option(&mut fields, "License", &self.license);

        for classifier in &self.classifiers {
            fields.push(("Classifier".to_string(), classifier.clone()));
        }
        add_option(&mut fields, "Requires-Python", &self.requires_python);
        for requirement in &self.requires_dist {
            fields.push(("Requires-Dist".to_string(), requirement.clone()));
        }
        for extra in &self.provides_extra {
            fields.push(("Provides-Extra".to_string(), extra.clone()));
        }
        for (key, value) in &self.project_url {
            fields.push(("Project-URL".to_string(), format!("{key}, {value}")));
        }
        add_option(&mut fields, "Description-Content-Type", &self.description_content_type);

        // Description is last so it can become the RFC 822 message body.
        if let Some(description) = &self.description {
            fields.push(("Description".to_string(), description.clone()));
        }

        fields
    }

    /// Renders the full `METADATA`/`PKG-INFO` document: headers followed by
    /// a blank line and the description body, if any.
    pub fn to_file_contents(&self) -> String {
        let mut fields = self.to_vec();
        let body = match fields.last() {
            Some((key, _)) if key == "Description" => fields.pop().map(|(_, value)| value),
            _ => None,
        };

        let mut out = String::new();
        for (key, value) in fields {
            out += &format!("{key}: {value}\n");
        }
        if let Some(body) = body {
            out += &format!("\n{body}\n");
        }
        out
    }

    /// PEP 427 "Escaping and Unicode" distribution-name normalization.
    pub fn get_distribution_escaped(&self) -> String {
        ESCAPE_NON_WORD.replace_all(&self.name, "_").to_string()
    }

    /// PEP 427 "Escaping and Unicode" version normalization.
    pub fn get_version_escaped(&self) -> String {
        ESCAPE_NON_WORD.replace_all(&self.version, "_").to_string()
    }

    /// The `{name}-{version}.dist-info` directory name.
    pub fn get_dist_info_dir(&self) -> PathBuf {
        PathBuf::from(format!(
            "{}-{}.dist-info",
            self.get_distribution_escaped(),
            self.get_version_escaped()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pep440_rs::Version;
    use std::str::FromStr;

    fn minimal_metadata() -> Metadata {
        Metadata {
            name: "info-project".to_string(),
            version: Version::from_str("0.1.0").unwrap().to_string(),
            summary: Some("A test project".to_string()),
            description: Some("# Some test package\n".to_string()),
            description_content_type: Some("text/markdown; charset=UTF-8".to_string()),
            keywords: vec!["ffi".to_string(), "test".to_string()],
            author: Some("konstin".to_string()),
            author_email: None,
            maintainer: None,
            maintainer_email: None,
            license: None,
            classifiers: vec!["Programming Language :: Python".to_string()],
            requires_dist: vec!["flask~=1.1.0".to_string()],
            requires_python: None,
            project_url: IndexMap::new(),
            provides_extra: Vec::new(),
        }
    }

    #[test]
    fn to_file_contents_puts_description_last_as_body() {
        let rendered = minimal_metadata().to_file_contents();
        assert!(rendered.starts_with("Metadata-Version: 2.2\n"));
        assert!(rendered.ends_with("# Some test package\n\n"));
    }

    #[test]
    fn dist_info_dir_uses_escaped_name_and_version() {
        let metadata = minimal_metadata();
        assert_eq!(
            metadata.get_dist_info_dir(),
            PathBuf::from("info_project-0.1.0.dist-info")
        );
    }

    #[test]
    fn requires_dist_extra_marker_composes_with_existing_marker() {
        let req = pep508_rs::Requirement::from_str("requests>=2; python_version >= \"3.8\"").unwrap();
        let formatted = format_requirement_with_extra(&req, "web");
        assert_eq!(
            formatted,
            "requests>=2; python_version >= \"3.8\" and extra == \"web\""
        );
    }

    #[test]
    fn requires_dist_extra_marker_without_existing_marker() {
        let req = pep508_rs::Requirement::from_str("requests>=2").unwrap();
        let formatted = format_requirement_with_extra(&req, "web");
        assert_eq!(formatted, "requests>=2; extra == \"web\"");
    }

    #[test]
    fn rendered_headers_recover_every_declared_field() {
        let metadata = minimal_metadata();
        let rendered = metadata.to_file_contents();

        let mut headers = std::collections::HashMap::new();
        for line in rendered.lines() {
            if line.is_empty() {
                break;
            }
            let (key, value) = line.split_once(": ").unwrap();
            headers.insert(key, value);
        }

        assert_eq!(headers["Name"], metadata.name);
        assert_eq!(headers["Version"], metadata.version);
        assert_eq!(headers["Summary"], metadata.summary.as_deref().unwrap());
        assert_eq!(headers["Keywords"], metadata.keywords.join(" "));
        assert_eq!(headers["Author"], metadata.author.as_deref().unwrap());
        assert_eq!(headers["Requires-Dist"], metadata.requires_dist[0]);
        assert_eq!(headers["Classifier"], metadata.classifiers[0]);

        let body = rendered.rsplit("\n\n").next().unwrap();
        assert_eq!(body, format!("{}\n", metadata.description.as_deref().unwrap()));
    }
}
