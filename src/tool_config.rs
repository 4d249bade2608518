//! C3: Tool-config validator.
//!
//! Loads `[tool.whey]`. Unknown keys are *warned*, not rejected, because
//! third-party builders may read them (spec §4.3) — unlike [`crate::project_config`],
//! which denies unknown keys outright. Grounded on
//! `pyproject_toml.rs::ToolMaturin` (an all-optional tool-namespaced config
//! struct) and its `Format`/`Formats`/`GlobPattern` pattern, reused here for
//! [`ManifestDirective`].

use serde::Deserialize;

use crate::error::{Diagnostic, Result, WheyError};

/// A single `additional_files` entry (spec §3 `ManifestDirective`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestDirective {
    Include(Vec<String>),
    Exclude(Vec<String>),
    RecursiveInclude(String, Vec<String>),
    RecursiveExclude(String, Vec<String>),
}

/// Parses a MANIFEST.in-style directive line, e.g.
/// `"include spam/data/*.txt"` or `"recursive-exclude spam/data tmp_*"`.
fn parse_directive_line(line: &str) -> Result<ManifestDirective> {
    let mut words = line.split_whitespace();
    let verb = words
        .next()
        .ok_or_else(|| WheyError::config("tool.whey.additional-files", "empty manifest directive"))?;
    let rest: Vec<&str> = words.collect();
    match verb {
        "include" => Ok(ManifestDirective::Include(
            rest.into_iter().map(str::to_string).collect(),
        )),
        "exclude" => Ok(ManifestDirective::Exclude(
            rest.into_iter().map(str::to_string).collect(),
        )),
        "recursive-include" => {
            let (dir, patterns) = rest.split_first().ok_or_else(|| {
                WheyError::config(
                    "tool.whey.additional-files",
                    "`recursive-include` requires a directory and at least one pattern",
                )
            })?;
            Ok(ManifestDirective::RecursiveInclude(
                dir.to_string(),
                patterns.iter().map(|s| s.to_string()).collect(),
            ))
        }
        "recursive-exclude" => {
            let (dir, patterns) = rest.split_first().ok_or_else(|| {
                WheyError::config(
                    "tool.whey.additional-files",
                    "`recursive-exclude` requires a directory and at least one pattern",
                )
            })?;
            Ok(ManifestDirective::RecursiveExclude(
                dir.to_string(),
                patterns.iter().map(|s| s.to_string()).collect(),
            ))
        }
        other => Err(WheyError::config(
            "tool.whey.additional-files",
            format!("unknown manifest directive verb: {other:?}"),
        )),
    }
}

/// Builder-role names (spec §3 `ToolConfig.builders`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Builders {
    pub sdist: Option<String>,
    pub wheel: Option<String>,
    pub binary: Option<String>,
}

/// The `[tool.whey]` view (spec §3 `ToolConfig`).
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub package: String,
    pub source_dir: String,
    pub additional_files: Vec<ManifestDirective>,
    pub license_key: Option<String>,
    pub base_classifiers: Vec<String>,
    pub platforms: Vec<String>,
    pub python_implementations: Vec<String>,
    pub python_versions: Vec<String>,
    pub builders: Builders,
}

/// The raw, permissive deserialization target for `[tool.whey]`. Every field
/// is optional; unrecognized keys are detected separately via
/// [`warn_unknown_tool_keys`] rather than through `deny_unknown_fields`.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
struct RawToolConfig {
    package: Option<String>,
    source_dir: Option<String>,
    additional_files: Vec<String>,
    license_key: Option<String>,
    base_classifiers: Vec<String>,
    platforms: Vec<String>,
    python_implementations: Vec<String>,
    python_versions: Vec<String>,
    builders: Option<RawBuilders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
struct RawBuilders {
    sdist: Option<String>,
    wheel: Option<String>,
    binary: Option<String>,
}

const KNOWN_TOOL_KEYS: &[&str] = &[
    "package",
    "source-dir",
    "additional-files",
    "license-key",
    "base-classifiers",
    "platforms",
    "python-implementations",
    "python-versions",
    "builders",
];

/// Diffs `[tool.whey]`'s keys against the known set and returns a
/// [`Diagnostic`] per unrecognized key (spec §4.3: warned, not rejected).
fn warn_unknown_tool_keys(raw: &toml::Value) -> Vec<Diagnostic> {
    let Some(table) = raw
        .get("tool")
        .and_then(|t| t.get("whey"))
        .and_then(toml::Value::as_table)
    else {
        return Vec::new();
    };
    table
        .keys()
        .filter(|key| !KNOWN_TOOL_KEYS.contains(&key.as_str()))
        .map(|key| Diagnostic::new(format!("unknown key `tool.whey.{key}` was ignored")))
        .collect()
}

/// Loads `[tool.whey]`, applying defaults (`package` from `project.name`,
/// `source_dir` defaulting to `"."`) and returning non-fatal diagnostics for
/// unrecognized keys.
pub fn load_tool_config(raw: &toml::Value, project_name: &str) -> Result<(ToolConfig, Vec<Diagnostic>)> {
    let diagnostics = warn_unknown_tool_keys(raw);

    let raw_tool: RawToolConfig = raw
        .get("tool")
        .and_then(|t| t.get("whey"))
        .cloned()
        .unwrap_or(toml::Value::Table(Default::default()))
        .try_into()
        .map_err(|error| WheyError::config("tool.whey", format!("does not match the expected shape: {error}")))?;

    let additional_files = raw_tool
        .additional_files
        .iter()
        .map(|line| parse_directive_line(line))
        .collect::<Result<Vec<_>>>()?;

    let builders = raw_tool.builders.unwrap_or_default();

    Ok((
        ToolConfig {
            package: raw_tool.package.unwrap_or_else(|| project_name.to_string()),
            source_dir: raw_tool.source_dir.unwrap_or_else(|| ".".to_string()),
            additional_files,
            license_key: raw_tool.license_key,
            base_classifiers: raw_tool.base_classifiers,
            platforms: raw_tool.platforms,
            python_implementations: raw_tool.python_implementations,
            python_versions: raw_tool.python_versions,
            builders: Builders {
                sdist: builders.sdist,
                wheel: builders.wheel,
                binary: builders.binary,
            },
        },
        diagnostics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults_package_to_project_name() {
        let raw: toml::Value = toml::from_str("").unwrap();
        let (tool, _) = load_tool_config(&raw, "spam").unwrap();
        assert_eq!(tool.package, "spam");
        assert_eq!(tool.source_dir, ".");
    }

    #[test]
    fn parses_manifest_directives() {
        let raw: toml::Value = toml::from_str(indoc! {r#"
            [tool.whey]
            additional-files = [
                "include spam/data/*.txt",
                "recursive-exclude spam/data tmp_*",
            ]
        "#})
        .unwrap();
        let (tool, _) = load_tool_config(&raw, "spam").unwrap();
        assert_eq!(
            tool.additional_files,
            vec![
                ManifestDirective::Include(vec!["spam/data/*.txt".to_string()]),
                ManifestDirective::RecursiveExclude(
                    "spam/data".to_string(),
                    vec!["tmp_*".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn warns_but_does_not_reject_unknown_key() {
        let raw: toml::Value = toml::from_str(indoc! {r#"
            [tool.whey]
            not-a-real-key = true
        "#})
        .unwrap();
        let (_, diagnostics) = load_tool_config(&raw, "spam").unwrap();
        assert_eq!(diagnostics.len(), 1);
    }
}
