//! C9: Editable-wheel builder.
//!
//! Same dist-info layout as C8, but the package tree itself is never
//! embedded — a `.pth` file prepends `source_dir` to the import search path
//! instead (spec §4.9). The `editables`-module redirector variant spec §4.9
//! also allows is not implemented: that collaborator lives in the Python
//! ecosystem, outside what this crate can produce on its own, so this
//! builder always takes the `.pth` path.

use std::path::{Path, PathBuf};

use anyhow::Result;
use fs_err as fs;
use ignore::overrides::Override;

use crate::module_writer::{WheelWriter, VirtualWriter, write_entry_points, write_pth};

use super::PreparedBuild;
use super::wheel::file_options;
use super::WHEEL_TAG;

/// Builds an editable `{name}-{version}-py3-none-any.whl` under `out_dir`:
/// dist-info plus a `.pth` redirector, no package files (spec §4.9).
pub fn build(prepared: &PreparedBuild, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;

    let inner = WheelWriter::new(WHEEL_TAG, out_dir, &prepared.metadata, file_options(prepared.mtime))?;
    let mut writer = VirtualWriter::new(inner, Override::empty());

    let source_dir = prepared.project_root.join(&prepared.tool.source_dir);
    write_pth(&mut writer, &source_dir, &prepared.metadata)?;
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

#[cfg(test)]
mod tests {
    use fs_err as fs;
    use indoc::indoc;
    use tempfile::TempDir;

    use crate::build::prepare;

    use super::build;

    #[test]
    fn editable_wheel_omits_package_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            indoc! {r#"
                [project]
                name = "spam"
                version = "1.0"
            "#},
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("spam")).unwrap();
        fs::write(dir.path().join("spam/__init__.py"), "").unwrap();

        let prepared = prepare(dir.path()).unwrap();
        let out_dir = dir.path().join("dist");
        let archive = build(&prepared, &out_dir).unwrap();

        let file = fs::File::open(&archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(!names.contains(&"spam/__init__.py".to_string()));
        assert!(names.iter().any(|name| name.ends_with(".pth")));
        assert!(names.contains(&"spam-1.0.dist-info/RECORD".to_string()));
    }
}
