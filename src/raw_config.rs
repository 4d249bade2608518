//! C1: TOML loader.
//!
//! Parses `pyproject.toml` into a [`toml::Value`] tree ("RawConfig" in
//! spec §3) and rejects constructs that only make sense under TOML 1.0.0
//! semantics, so every later component sees an already-validated syntax
//! tree. Grounded on `cargo_toml.rs::CargoToml::from_path` (read-then-parse,
//! reporting which step failed) and `pyproject_toml.rs::PyProjectToml::new`.

use std::path::Path;

use fs_err as fs;

use crate::error::{Result, WheyError};

/// The parsed TOML document, before any PEP 621 / tool-config interpretation.
pub type RawConfig = toml::Value;

/// Reads and parses `path` as a [`RawConfig`].
pub fn load_raw_config(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|source| WheyError::Io { path: path.to_path_buf(), source })?;
    parse_raw_config(&contents).map_err(|error| match error {
        WheyError::Config { field, reason } => {
            WheyError::config(field, format!("{} ({})", reason, path.display()))
        }
        other => other,
    })
}

/// Parses `contents` as a [`RawConfig`], rejecting TOML 1.0.0-only constructs.
pub fn parse_raw_config(contents: &str) -> Result<RawConfig> {
    let value: toml::Value =
        toml::from_str(contents).map_err(|error| WheyError::config("pyproject.toml", format!("invalid TOML syntax: {error}")))?;
    reject_post_0_5_0_constructs(&value)?;
    Ok(value)
}

/// TOML 0.5.0 required every element of an array to share the same type.
/// Heterogeneous arrays are a 1.0.0-era relaxation; reject them so that
/// later components only ever see syntax that would also have been valid
/// under 0.5.0.
fn reject_post_0_5_0_constructs(value: &toml::Value) -> Result<()> {
    match value {
        toml::Value::Array(items) => {
            if let Some(first) = items.first() {
                let first_kind = value_kind(first);
                for item in &items[1..] {
                    if value_kind(item) != first_kind {
                        return Err(WheyError::config(
                            "pyproject.toml",
                            format!(
                                "mixed-type arrays require TOML 1.0.0 semantics, which is not \
                                 supported here (found `{first_kind}` and `{}` in the same array)",
                                value_kind(item)
                            ),
                        ));
                    }
                }
            }
            for item in items {
                reject_post_0_5_0_constructs(item)?;
            }
            Ok(())
        }
        toml::Value::Table(table) => {
            for v in table.values() {
                reject_post_0_5_0_constructs(v)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn value_kind(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "string",
        toml::Value::Integer(_) => "integer",
        toml::Value::Float(_) => "float",
        toml::Value::Boolean(_) => "boolean",
        toml::Value::Datetime(_) => "datetime",
        toml::Value::Array(_) => "array",
        toml::Value::Table(_) => "table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn accepts_homogeneous_array() {
        let toml = indoc! {r#"
            [project]
            keywords = ["a", "b", "c"]
        "#};
        assert!(parse_raw_config(toml).is_ok());
    }

    #[test]
    fn rejects_mixed_type_array() {
        let toml = indoc! {r#"
            [project]
            keywords = ["a", 1, true]
        "#};
        assert!(parse_raw_config(toml).is_err());
    }

    #[test]
    fn rejects_invalid_syntax() {
        assert!(parse_raw_config("this is not = = toml").is_err());
    }
}
