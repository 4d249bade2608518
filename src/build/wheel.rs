//! C8: Wheel builder.
//!
//! Grounded on `module_writer/wheel_writer.rs` (ZIP, `StreamSha256`,
//! dist-info-last ordering, `RECORD` generation); tags are fixed to
//! `py3-none-any` since this tool builds no native code (spec §4.8).

use std::path::{Path, PathBuf};

use anyhow::Result;
use fs_err as fs;
use ignore::overrides::Override;
use zip::write::SimpleFileOptions;

use crate::module_writer::{WheelWriter, VirtualWriter, add_selected_files, write_entry_points};
use crate::reproducible;

use super::{PreparedBuild, WHEEL_TAG};

pub(super) fn file_options(mtime: u64) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(reproducible::to_zip_datetime(mtime))
}

/// Builds `{name}-{version}-py3-none-any.whl` under `out_dir` (spec §4.8).
pub fn build(prepared: &PreparedBuild, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;

    let inner = WheelWriter::new(WHEEL_TAG, out_dir, &prepared.metadata, file_options(prepared.mtime))?;
    let mut writer = VirtualWriter::new(inner, Override::empty());

    add_selected_files(&mut writer, &prepared.project_root, Path::new(""), &prepared.files)?;
    write_entry_points(
        &mut writer,
        &prepared.metadata.get_dist_info_dir(),
        &prepared.project.scripts,
        &prepared.project.gui_scripts,
        &prepared.project.entry_points,
    )?;

    writer.finish(
        &prepared.metadata,
        &prepared.project_root,
        prepared.project.license.as_ref(),
        &[WHEEL_TAG.to_string()],
    )
}
