//! C10: Builder registry.
//!
//! Maps a builder *role* (`sdist`, `wheel`, `binary`) to a builder *name*.
//! The original maturin resolves names through the ambient Cargo/plugin
//! registry it already depends on; this crate has no such host to resolve
//! third-party names against, so [`BuilderRegistry`] only ever resolves to
//! the three built-in names it implements itself (spec §4.10), and treats
//! any configured name that isn't one of those as a [`WheyError::Plugin`]
//! error rather than pretending to look it up elsewhere.

use crate::error::WheyError;
use crate::tool_config::Builders;

/// A builder role requested by the CLI or a PEP 517 hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderRole {
    Sdist,
    Wheel,
    EditableWheel,
    Binary,
}

pub const DEFAULT_SDIST_BUILDER: &str = "whey_sdist";
pub const DEFAULT_WHEEL_BUILDER: &str = "whey_wheel";
pub const DEFAULT_BINARY_BUILDER: &str = "whey_binary";

/// Resolves `tool.whey.builders` against the known built-in names, falling
/// back to the defaults named in spec §4.10.
pub struct BuilderRegistry {
    sdist: String,
    wheel: String,
    binary: Option<String>,
}

impl BuilderRegistry {
    pub fn new(builders: &Builders) -> Self {
        Self {
            sdist: builders
                .sdist
                .clone()
                .unwrap_or_else(|| DEFAULT_SDIST_BUILDER.to_string()),
            wheel: builders
                .wheel
                .clone()
                .unwrap_or_else(|| DEFAULT_WHEEL_BUILDER.to_string()),
            binary: builders.binary.clone(),
        }
    }

    /// Resolves `role` to a builder name, failing with [`WheyError::Plugin`]
    /// if the role has no implementation registered (currently always true
    /// for [`BuilderRole::Binary`], since native-extension compilation is
    /// out of scope).
    pub fn resolve(&self, role: BuilderRole) -> Result<&str, WheyError> {
        match role {
            BuilderRole::Sdist if self.sdist == DEFAULT_SDIST_BUILDER => Ok(self.sdist.as_str()),
            BuilderRole::Wheel | BuilderRole::EditableWheel if self.wheel == DEFAULT_WHEEL_BUILDER => {
                Ok(self.wheel.as_str())
            }
            BuilderRole::Binary => {
                let name = self.binary.clone().unwrap_or_else(|| DEFAULT_BINARY_BUILDER.to_string());
                Err(WheyError::Plugin { role: name, known: self.known_names() })
            }
            BuilderRole::Sdist => Err(WheyError::Plugin { role: self.sdist.clone(), known: self.known_names() }),
            BuilderRole::Wheel | BuilderRole::EditableWheel => {
                Err(WheyError::Plugin { role: self.wheel.clone(), known: self.known_names() })
            }
        }
    }

    fn known_names(&self) -> String {
        format!("{DEFAULT_SDIST_BUILDER}, {DEFAULT_WHEEL_BUILDER}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_builtin_names() {
        let registry = BuilderRegistry::new(&Builders::default());
        assert_eq!(registry.resolve(BuilderRole::Sdist).unwrap(), DEFAULT_SDIST_BUILDER);
        assert_eq!(registry.resolve(BuilderRole::Wheel).unwrap(), DEFAULT_WHEEL_BUILDER);
    }

    #[test]
    fn binary_role_has_no_builtin_builder() {
        let registry = BuilderRegistry::new(&Builders::default());
        assert!(registry.resolve(BuilderRole::Binary).is_err());
    }

    #[test]
    fn unrecognized_configured_name_is_a_plugin_error() {
        let builders = Builders { sdist: Some("custom_sdist".to_string()), wheel: None, binary: None };
        let registry = BuilderRegistry::new(&builders);
        assert!(registry.resolve(BuilderRole::Sdist).is_err());
    }
}
