//! Top-level error type surfaced at the CLI and PEP 517 hook boundary.
//!
//! [`crate::project_config`], [`crate::file_selection`], and
//! [`crate::raw_config`] construct these variants directly, since spec §7
//! requires their failures to carry a distinguishable *kind* (config vs.
//! file-selection vs. I/O) rather than just an opaque message chain. Other
//! internal plumbing still uses plain [`anyhow::Result`] with `.context(...)`
//! and converts into [`WheyError::Other`] at the boundary.

use std::path::PathBuf;

use thiserror::Error;

/// A non-fatal diagnostic collected during a build (spec §7 "Warning" kind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Diagnostic { message: message.into() }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Error)]
pub enum WheyError {
    /// A required field is missing, a value has the wrong shape, a dynamic
    /// field is not permitted, or mutually exclusive keys are both set.
    #[error("configuration error at `{field}`: {reason}")]
    Config { field: String, reason: String },

    /// A referenced path does not exist, matches no files, or escapes the
    /// project root.
    #[error("file selection error: {0}")]
    FileSelection(String),

    /// A named builder is not registered.
    #[error("no builder registered for role `{role}`; known names: {known}")]
    Plugin { role: String, known: String },

    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WheyError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        WheyError::Config { field: field.into(), reason: reason.into() }
    }

    pub fn file_selection(reason: impl Into<String>) -> Self {
        WheyError::FileSelection(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, WheyError>;
