//! C7: Sdist builder.
//!
//! Grounded on `module_writer/sdist_writer.rs` (tar.gz, deterministic mode,
//! `PKG-INFO`-first ordering), wired to the new [`super::PreparedBuild`]
//! instead of a Cargo-metadata-derived source tree.

use std::path::{Path, PathBuf};

use anyhow::Result;
use fs_err as fs;
use ignore::overrides::Override;

use crate::module_writer::{SDistWriter, VirtualWriter, add_selected_files};

use super::PreparedBuild;

/// Builds `{name}-{version}.tar.gz` under `out_dir` (spec §4.7). Returns the
/// artifact's filesystem path.
pub fn build(prepared: &PreparedBuild, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;

    let archive_prefix = PathBuf::from(format!(
        "{}-{}",
        prepared.metadata.get_distribution_escaped(),
        prepared.metadata.get_version_escaped()
    ));
    let pkg_info_path = archive_prefix.join("PKG-INFO");

    let inner = SDistWriter::new(out_dir, &prepared.metadata, Some(prepared.mtime))?;
    let mut writer = VirtualWriter::new(inner, Override::empty());

    add_selected_files(&mut writer, &prepared.project_root, &archive_prefix, &prepared.files)?;
    writer.add_file(
        archive_prefix.join("pyproject.toml"),
        prepared.project_root.join("pyproject.toml"),
        false,
    )?;
    writer.add_bytes(
        &pkg_info_path,
        None,
        prepared.metadata.to_file_contents().as_bytes(),
        false,
    )?;

    writer.finish(&pkg_info_path)
}

#[cfg(test)]
mod tests {
    use fs_err as fs;
    use indoc::indoc;
    use tempfile::TempDir;

    use crate::build::prepare;

    use super::build;

    fn project(pyproject: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), pyproject).unwrap();
        fs::create_dir_all(dir.path().join("spam")).unwrap();
        fs::write(dir.path().join("spam/__init__.py"), "").unwrap();
        dir
    }

    #[test]
    fn sdist_contains_pkg_info_and_pyproject_toml() {
        let dir = project(indoc! {r#"
            [project]
            name = "spam"
            version = "1.0"
        "#});
        let prepared = prepare(dir.path()).unwrap();
        let out_dir = dir.path().join("dist");
        let archive = build(&prepared, &out_dir).unwrap();
        assert!(archive.ends_with("spam-1.0.tar.gz"));

        let file = fs::File::open(&archive).unwrap();
        let decoder = flate2::read::GzDecoder::new(file);
        let mut tar = tar::Archive::new(decoder);
        let names: Vec<String> = tar
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"spam-1.0/PKG-INFO".to_string()));
        assert!(names.contains(&"spam-1.0/pyproject.toml".to_string()));
        assert!(names.contains(&"spam-1.0/spam/__init__.py".to_string()));
    }
}
