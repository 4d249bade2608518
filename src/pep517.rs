//! C10: PEP 517 / PEP 660 backend hooks (spec §6).
//!
//! Each hook operates on the current working directory as the project root,
//! matching the contract a Python-side `build_sdist`/`build_wheel` etc. shim
//! would call into. `config_settings` has no defined keys for this backend
//! and is accepted only for interface compatibility; callers pass `&[]`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use fs_err as fs;

use crate::build::{self, editable, sdist, wheel};

/// `build_sdist(out_dir, config_settings=None) -> filename`
pub fn build_sdist(out_dir: &Path) -> Result<String> {
    let project_root = std::env::current_dir()?;
    let prepared = build::prepare(&project_root)?;
    let path = sdist::build(&prepared, out_dir)?;
    filename(&path)
}

/// `build_wheel(out_dir, config_settings=None, metadata_directory=None) -> filename`
pub fn build_wheel(out_dir: &Path) -> Result<String> {
    let project_root = std::env::current_dir()?;
    let prepared = build::prepare(&project_root)?;
    let path = wheel::build(&prepared, out_dir)?;
    filename(&path)
}

/// `build_editable(out_dir, config_settings=None, metadata_directory=None) -> filename`
pub fn build_editable(out_dir: &Path) -> Result<String> {
    let project_root = std::env::current_dir()?;
    let prepared = build::prepare(&project_root)?;
    let path = editable::build(&prepared, out_dir)?;
    filename(&path)
}

/// `prepare_metadata_for_build_wheel(out_dir, config_settings=None) -> dist_info_dirname`
///
/// Writes the `.dist-info` directory directly under `out_dir` (not inside an
/// archive), so a frontend can inspect metadata before committing to a full
/// `build_wheel` call.
pub fn prepare_metadata_for_build_wheel(out_dir: &Path) -> Result<String> {
    let project_root = std::env::current_dir()?;
    let prepared = build::prepare(&project_root)?;
    write_dist_info_dir(out_dir, &prepared)
}

/// `prepare_metadata_for_build_editable` — same contract as above.
pub fn prepare_metadata_for_build_editable(out_dir: &Path) -> Result<String> {
    prepare_metadata_for_build_wheel(out_dir)
}

/// `get_requires_for_build_sdist` / `_wheel` / `_editable` — this backend has
/// no build-time requirements of its own beyond itself.
pub fn get_requires_for_build() -> Vec<String> {
    Vec::new()
}

fn write_dist_info_dir(out_dir: &Path, prepared: &build::PreparedBuild) -> Result<String> {
    let dist_info_dir = prepared.metadata.get_dist_info_dir();
    let absolute = out_dir.join(&dist_info_dir);
    fs::create_dir_all(&absolute)?;
    fs::write(absolute.join("METADATA"), prepared.metadata.to_file_contents())?;
    Ok(dist_info_dir.to_string_lossy().to_string())
}

fn filename(path: &PathBuf) -> Result<String> {
    Ok(path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string()))
}

#[cfg(test)]
mod tests {
    use fs_err as fs;
    use indoc::indoc;
    use tempfile::TempDir;

    use super::*;

    fn project() -> TempDir {
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
        dir
    }

    #[test]
    fn prepare_metadata_writes_dist_info_without_full_wheel() {
        let dir = project();
        let original_cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let out_dir = dir.path().join("meta");
        let result = prepare_metadata_for_build_wheel(&out_dir);
        std::env::set_current_dir(original_cwd).unwrap();

        let dirname = result.unwrap();
        assert_eq!(dirname, "spam-1.0.dist-info");
        assert!(out_dir.join("spam-1.0.dist-info/METADATA").is_file());
    }

    #[test]
    fn get_requires_for_build_is_empty() {
        assert!(get_requires_for_build().is_empty());
    }
}
