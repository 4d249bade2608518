//! Build orchestration: wires C1–C6 together into a [`PreparedBuild`] that
//! C7/C8/C9 each turn into an archive.
//!
//! Grounded on `build_context.rs`'s role as the teacher's single top-level
//! "everything needed to produce an artifact" struct, generalized from
//! Cargo-metadata-plus-Python-interpreter inputs to this crate's
//! TOML-plus-file-tree inputs.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::error::Diagnostic;
use crate::metadata::{self, Metadata};
use crate::project_config::{self, ProjectConfig, ReadmeSource};
use crate::readme;
use crate::reproducible;
use crate::tool_config::{self, ToolConfig};
use crate::{file_selection, raw_config, synth};

pub mod editable;
pub mod sdist;
pub mod wheel;

/// Everything a builder needs, already validated and synthesized.
pub struct PreparedBuild {
    pub project_root: PathBuf,
    pub project: ProjectConfig,
    pub tool: ToolConfig,
    pub metadata: Metadata,
    pub files: Vec<PathBuf>,
    pub mtime: u64,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs C1 through C6 over `project_root/pyproject.toml`, returning the
/// inputs a builder needs plus any non-fatal diagnostics collected along
/// the way (spec §7 "Warning" kind).
pub fn prepare(project_root: &Path) -> Result<PreparedBuild> {
    let pyproject_path = project_root.join("pyproject.toml");
    let raw = raw_config::load_raw_config(&pyproject_path)?;

    let project = project_config::load_project_config(&raw)?;
    let (tool, mut diagnostics) = tool_config::load_tool_config(&raw, &project.name)?;

    let synthesized = synth::synthesize(&project.dynamic, &tool)?;
    diagnostics.extend(synthesized.diagnostics);

    if readme::readme_check_enabled() {
        if let Some(readme_config) = &project.readme {
            if let Err(mut readme_diagnostics) = readme::validate(project_root, readme_config) {
                diagnostics.append(&mut readme_diagnostics);
            }
        }
    }

    let readme_body = project
        .readme
        .as_ref()
        .map(|readme_config| read_readme_body(project_root, &readme_config.source))
        .transpose()?;

    let metadata = metadata::build_metadata(
        &project,
        synthesized.classifiers,
        synthesized.requires_python.map(|specifiers| specifiers.to_string()),
        readme_body,
    );

    let files = file_selection::select_files(
        project_root,
        &tool.source_dir,
        &tool.package,
        &tool.additional_files,
    )?;
    debug!("selected {} files for {}", files.len(), project.name);

    let epoch_override = reproducible::source_date_epoch_from_env()?;
    let mtime = reproducible::resolve_mtime(epoch_override, &pyproject_path)?;

    Ok(PreparedBuild { project_root: project_root.to_path_buf(), project, tool, metadata, files, mtime, diagnostics })
}

fn read_readme_body(project_root: &Path, source: &ReadmeSource) -> Result<String> {
    match source {
        ReadmeSource::File(path) => {
            let absolute = project_root.join(path);
            fs_err::read_to_string(&absolute)
                .with_context(|| format!("can't read project.readme file at {}", absolute.display()))
        }
        ReadmeSource::Text(text) => Ok(text.clone()),
    }
}

/// `py3-none-any`, the only tag this tool ever produces (spec §4.8): it
/// builds no native extensions.
pub const WHEEL_TAG: &str = "py3-none-any";
