//! C2: PEP 621 validator.
//!
//! Walks the `[project]` table (already parsed into the `pyproject-toml`
//! crate's [`pyproject_toml::Project`] type, the same crate the teacher
//! depends on) and re-validates it against the stricter rules spec §3/§4.2
//! impose: unknown-key rejection, dynamic-field gating, classifier
//! validation, and the readme/license mutual-exclusion rules.

use std::collections::BTreeSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use pep440_rs::VersionSpecifiers;
use pep508_rs::Requirement;
use pyproject_toml::{Contact, License as RawLicense, PyProjectToml as RawPyProjectToml, ReadMe as RawReadMe};

use crate::classifiers_data::is_known_classifier;
use crate::error::{Result, WheyError};

/// The fields that may legally appear in `project.dynamic` (spec §4.2
/// "Dynamic gating").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DynamicField {
    Classifiers,
    Dependencies,
    RequiresPython,
}

impl DynamicField {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "classifiers" => Some(DynamicField::Classifiers),
            "dependencies" => Some(DynamicField::Dependencies),
            "requires-python" => Some(DynamicField::RequiresPython),
            _ => None,
        }
    }
}

/// `project.license`: the two keys are mutually exclusive, exactly one of
/// them is present if the table is given at all (spec §3). A bare SPDX
/// expression string, while supported by the underlying crate (PEP 639), is
/// rejected here: spec §3 only allows the two-key table form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseRef {
    File(PathBuf),
    Text(String),
}

/// `project.authors`/`project.maintainers` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// `project.readme`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadmeSource {
    File(PathBuf),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readme {
    pub source: ReadmeSource,
    pub content_type: String,
    pub charset: String,
}

/// The normalized PEP 621 view (spec §3 `ProjectConfig`).
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub name: String,
    pub version: pep440_rs::Version,
    pub description: Option<String>,
    pub readme: Option<Readme>,
    pub requires_python: Option<VersionSpecifiers>,
    pub license: Option<LicenseRef>,
    pub authors: Vec<Person>,
    pub maintainers: Vec<Person>,
    pub keywords: Vec<String>,
    pub classifiers: Vec<String>,
    pub urls: IndexMap<String, String>,
    pub scripts: IndexMap<String, String>,
    pub gui_scripts: IndexMap<String, String>,
    pub entry_points: IndexMap<String, IndexMap<String, String>>,
    pub dependencies: Vec<Requirement>,
    pub optional_dependencies: IndexMap<String, Vec<Requirement>>,
    pub dynamic: BTreeSet<DynamicField>,
}

const KNOWN_PROJECT_KEYS: &[&str] = &[
    "name",
    "version",
    "description",
    "readme",
    "requires-python",
    "license",
    "license-files",
    "authors",
    "maintainers",
    "keywords",
    "classifiers",
    "urls",
    "entry-points",
    "scripts",
    "gui-scripts",
    "dependencies",
    "optional-dependencies",
    "dynamic",
];

/// Rejects unknown keys at the top of `[project]` (spec §4.2).
fn reject_unknown_project_keys(raw: &toml::Value) -> Result<()> {
    let Some(project) = raw.get("project").and_then(toml::Value::as_table) else {
        return Ok(());
    };
    for key in project.keys() {
        if !KNOWN_PROJECT_KEYS.contains(&key.as_str()) {
            return Err(WheyError::config(format!("project.{key}"), "unknown key"));
        }
    }
    Ok(())
}

/// Parses and validates the `[project]` table out of an already-loaded
/// [`crate::raw_config::RawConfig`].
pub fn load_project_config(raw: &toml::Value) -> Result<ProjectConfig> {
    reject_unknown_project_keys(raw)?;

    let parsed: RawPyProjectToml = raw
        .clone()
        .try_into()
        .map_err(|error| WheyError::config("project", format!("does not match the PEP 517/621 schema: {error}")))?;
    let project = parsed
        .project
        .ok_or_else(|| WheyError::config("project", "missing required `[project]` table"))?;

    let dynamic = parse_dynamic(&project.dynamic)?;

    let version = project
        .version
        .ok_or_else(|| WheyError::config("project.version", "is required and must be statically declared"))?;

    if let Some(raw_dynamic) = &project.dynamic {
        for field in ["name", "version"] {
            if raw_dynamic.iter().any(|d| d == field) {
                return Err(WheyError::config(
                    format!("project.{field}"),
                    "must not appear in `project.dynamic`; it is required and static",
                ));
            }
        }
    }

    let readme = project.readme.map(convert_readme).transpose()?;

    let license = match project.license {
        None => None,
        Some(RawLicense::File { file }) => Some(LicenseRef::File(file)),
        Some(RawLicense::Text { text }) => Some(LicenseRef::Text(text)),
        Some(RawLicense::Spdx(_)) => {
            return Err(WheyError::config(
                "project.license",
                "must be a `{ file = ... }` or `{ text = ... }` table, not a bare SPDX \
                 expression string",
            ));
        }
    };

    let authors = convert_people(project.authors.unwrap_or_default(), "project.authors")?;
    let maintainers = convert_people(
        project.maintainers.unwrap_or_default(),
        "project.maintainers",
    )?;

    let classifiers = project.classifiers.unwrap_or_default();
    if !dynamic.contains(&DynamicField::Classifiers) {
        for classifier in &classifiers {
            if !is_known_classifier(classifier) {
                return Err(WheyError::config(
                    "project.classifiers",
                    format!("unknown trove classifier: {classifier:?}"),
                ));
            }
        }
    }

    let entry_points = project.entry_points.unwrap_or_default();
    for group in entry_points.keys() {
        if group == "console_scripts" || group == "gui_scripts" {
            return Err(WheyError::config(
                format!("project.entry-points.{group}"),
                "forbidden; use `project.scripts` or `project.gui-scripts` instead",
            ));
        }
    }

    let optional_dependencies = project.optional_dependencies.unwrap_or_default();
    for extra in optional_dependencies.keys() {
        validate_extra_name(extra)?;
    }

    // Per spec §4.4, the tool never synthesizes non-empty dependencies even
    // when `dependencies` is listed as dynamic; an empty list is correct in
    // both cases, so no special-casing is needed here.
    let dependencies = project.dependencies.unwrap_or_default();

    Ok(ProjectConfig {
        name: project.name,
        version,
        description: project.description,
        readme,
        requires_python: project.requires_python,
        license,
        authors,
        maintainers,
        keywords: project.keywords.unwrap_or_default(),
        classifiers,
        urls: project.urls.unwrap_or_default(),
        scripts: project.scripts.unwrap_or_default(),
        gui_scripts: project.gui_scripts.unwrap_or_default(),
        entry_points,
        dependencies,
        optional_dependencies,
        dynamic,
    })
}

fn parse_dynamic(raw: &Option<Vec<String>>) -> Result<BTreeSet<DynamicField>> {
    let mut set = BTreeSet::new();
    for name in raw.iter().flatten() {
        match DynamicField::from_str(name) {
            Some(field) => {
                set.insert(field);
            }
            None => {
                return Err(WheyError::config(
                    "project.dynamic",
                    format!(
                        "{name:?} is not a permitted entry; only `classifiers`, `dependencies`, \
                         and `requires-python` may be synthesized"
                    ),
                ));
            }
        }
    }
    Ok(set)
}

fn convert_readme(readme: RawReadMe) -> Result<Readme> {
    match readme {
        RawReadMe::RelativePath(path) => {
            let content_type = infer_content_type(&PathBuf::from(&path));
            Ok(Readme {
                source: ReadmeSource::File(PathBuf::from(path)),
                content_type,
                charset: "UTF-8".to_string(),
            })
        }
        RawReadMe::Table { file, text, content_type } => {
            let source = match (file, text) {
                (Some(_), Some(_)) => {
                    return Err(WheyError::config(
                        "project.readme",
                        "`file` and `text` are mutually exclusive",
                    ));
                }
                (Some(file), None) => ReadmeSource::File(PathBuf::from(file)),
                (None, Some(text)) => ReadmeSource::Text(text),
                (None, None) => {
                    return Err(WheyError::config("project.readme", "must set `file` or `text`"));
                }
            };
            let content_type = content_type.unwrap_or_else(|| match &source {
                ReadmeSource::File(path) => infer_content_type(path),
                ReadmeSource::Text(_) => "text/plain".to_string(),
            });
            Ok(Readme { source, content_type, charset: "UTF-8".to_string() })
        }
    }
}

fn infer_content_type(path: &std::path::Path) -> String {
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("md") => "text/markdown".to_string(),
        Some("rst") => "text/x-rst".to_string(),
        _ => "text/plain".to_string(),
    }
}

fn convert_people(contacts: Vec<Contact>, field: &str) -> Result<Vec<Person>> {
    contacts
        .into_iter()
        .map(|contact| {
            let name = contact.name().map(str::to_string);
            if let Some(name) = &name {
                if name.contains(',') {
                    return Err(WheyError::config(
                        field,
                        format!("entry name must not contain a comma: {name:?}"),
                    ));
                }
            }
            Ok(Person { name, email: contact.email().map(str::to_string) })
        })
        .collect()
}

/// Extra names must match `[A-Za-z_][A-Za-z0-9_-]*` after normalization
/// (spec §3).
fn validate_extra_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_first = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_first || !valid_rest {
        return Err(WheyError::config(
            "project.optional-dependencies",
            format!("invalid extra name: {name:?}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(toml_text: &str) -> Result<ProjectConfig> {
        let raw: toml::Value = toml::from_str(toml_text).unwrap();
        load_project_config(&raw)
    }

    #[test]
    fn minimum_metadata() {
        let config = parse(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"
        "#})
        .unwrap();
        assert_eq!(config.name, "spam");
        assert!(config.dynamic.is_empty());
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        assert!(parse(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"
            not-a-real-key = true
        "#})
        .is_err());
    }

    #[test]
    fn rejects_name_or_version_as_dynamic() {
        assert!(parse(indoc! {r#"
            [project]
            name = "spam"
            dynamic = ["version"]
        "#})
        .is_err());
    }

    #[test]
    fn rejects_bad_dynamic_entry() {
        assert!(parse(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"
            dynamic = ["description"]
        "#})
        .is_err());
    }

    #[test]
    fn rejects_unknown_classifier() {
        assert!(parse(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"
            classifiers = ["Not :: A :: Real :: Classifier"]
        "#})
        .is_err());
    }

    #[test]
    fn rejects_bare_spdx_license_string() {
        assert!(parse(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"
            license = "MIT"
        "#})
        .is_err());
    }

    #[test]
    fn rejects_forbidden_entry_point_group() {
        assert!(parse(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"

            [project.entry-points.console_scripts]
            spam = "spam:main"
        "#})
        .is_err());
    }

    #[test]
    fn rejects_invalid_extra_name() {
        assert!(parse(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"

            [project.optional-dependencies]
            "bad name!" = ["requests"]
        "#})
        .is_err());
    }
}
