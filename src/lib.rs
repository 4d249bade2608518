//! whey: a PEP 621 build backend for pure-Python projects.
//!
//! Produces source distributions and wheels (including the editable-wheel
//! variant) directly from a project tree whose sole metadata source is
//! `pyproject.toml`. Exposes both a command-line surface ([`cli::Cli`]) and
//! the PEP 517/660 backend hooks ([`pep517`]).
//!
//! The pipeline: [`raw_config`] parses TOML into a raw tree, [`project_config`]
//! and [`tool_config`] validate and normalize it, [`synth`] fills in anything
//! listed as dynamic, [`file_selection`] resolves the set of files to ship,
//! [`metadata`] renders the Core Metadata document, and [`module_writer`]'s
//! archive writers (driven by [`build`]) produce the on-disk artifact.

pub mod archive_source;
pub mod build;
pub mod classifiers_data;
pub mod cli;
pub mod error;
pub mod file_selection;
pub mod metadata;
pub mod module_writer;
pub mod pep517;
pub mod project_config;
pub mod raw_config;
pub mod readme;
pub mod registry;
pub mod reproducible;
pub mod synth;
pub mod tool_config;

pub use error::{Diagnostic, WheyError};
pub use metadata::Metadata;
pub use module_writer::{ModuleWriter, VirtualWriter};
