//! C5: File-selection engine.
//!
//! Walks `source_dir/package`, applies built-in excludes, protects
//! `py.typed`/`*.pyi` markers, then replays `additional_files` directives in
//! order as mutations on the working set. Grounded on
//! `module_writer/glob.rs`'s `validate_pattern`/fnmatch-style glob matching
//! and on `ignore::WalkBuilder`, which the teacher already depends on for
//! directory traversal elsewhere in the crate.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{Result, WheyError};
use crate::tool_config::ManifestDirective;

/// Names and suffixes never included in the seed walk (spec §4.5 step 1).
fn is_builtin_excluded(name: &str) -> bool {
    matches!(name, "__pycache__" | ".git" | ".hg" | ".svn")
        || name.ends_with(".pyc")
        || name.ends_with(".pyo")
        || name.ends_with(".so~")
        || (name.starts_with('#') && name.ends_with('#'))
        || (name.ends_with('~') && name != "~")
}

/// Whether `relative_path` is a protected auto-inclusion (spec §4.5 step 2):
/// a `py.typed` marker or a `*.pyi` stub, anywhere under the package.
fn is_protected(relative_path: &Path) -> bool {
    match relative_path.file_name().and_then(|n| n.to_str()) {
        Some("py.typed") => true,
        Some(name) => name.ends_with(".pyi"),
        None => false,
    }
}

/// Builds the seed set by walking `project_root/source_dir/package`,
/// collecting paths relative to `project_root`.
fn walk_seed(project_root: &Path, source_dir: &str, package: &str) -> Result<BTreeSet<PathBuf>> {
    let package_root = project_root.join(source_dir).join(package);
    let mut seed = BTreeSet::new();
    if !package_root.is_dir() {
        return Ok(seed);
    }

    let walker = WalkBuilder::new(&package_root)
        .standard_filters(false)
        .hidden(false)
        .build();

    for entry in walker {
        let entry = entry.map_err(|error| WheyError::file_selection(format!("walking package directory: {error}")))?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(project_root).map_err(|_| {
            WheyError::file_selection(format!("seed file {} escaped project root", path.display()))
        })?;
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if is_builtin_excluded(name) && !is_protected(relative) {
            continue;
        }
        seed.insert(relative.to_path_buf());
    }
    Ok(seed)
}

/// Matches fnmatch-style `pattern` against every path under `root` relative
/// to `project_root`, restricted to paths that are themselves beneath
/// `root` when `root != project_root` (the `recursive-*` case).
fn glob_under(
    project_root: &Path,
    root: &Path,
    pattern: &str,
    candidates: impl Iterator<Item = PathBuf>,
) -> Result<Vec<PathBuf>> {
    let compiled = glob::Pattern::new(pattern)
        .map_err(|error| WheyError::file_selection(format!("invalid manifest glob pattern {pattern:?}: {error}")))?;
    let relative_root = if root == project_root {
        PathBuf::new()
    } else {
        root.strip_prefix(project_root)
            .map_err(|_| {
                WheyError::file_selection(format!(
                    "directive directory {} is outside the project root",
                    root.display()
                ))
            })?
            .to_path_buf()
    };

    let mut matched = Vec::new();
    for candidate in candidates {
        if !relative_root.as_os_str().is_empty() && !candidate.starts_with(&relative_root) {
            continue;
        }
        let scoped = candidate.strip_prefix(&relative_root).unwrap_or(candidate.as_path());
        if compiled.matches_path(scoped) {
            matched.push(candidate);
        }
    }
    Ok(matched)
}

/// Globs `pattern` directly against the filesystem under `root`, for
/// `include`/`recursive-include` directives that may reference files
/// outside the seed walk (e.g. top-level project files).
fn glob_filesystem(project_root: &Path, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped_root = PathBuf::from(glob::Pattern::escape(root.to_string_lossy().as_ref()));
    let full_pattern = escaped_root.join(pattern);
    let mut matched = Vec::new();
    for path in glob::glob(&full_pattern.to_string_lossy())
        .map_err(|error| WheyError::file_selection(format!("invalid manifest glob pattern {pattern:?}: {error}")))?
        .filter_map(std::result::Result::ok)
    {
        if path.is_dir() {
            continue;
        }
        let relative = path.strip_prefix(project_root).map_err(|_| {
            WheyError::file_selection(format!(
                "manifest directive match {} escaped project root",
                path.display()
            ))
        })?;
        matched.push(relative.to_path_buf());
    }
    Ok(matched)
}

/// Applies `additional_files` directives in order as mutations on
/// `working_set` (spec §4.5 step 3).
fn apply_directives(
    project_root: &Path,
    working_set: &mut BTreeSet<PathBuf>,
    directives: &[ManifestDirective],
) -> Result<()> {
    for directive in directives {
        match directive {
            ManifestDirective::Include(patterns) => {
                for pattern in patterns {
                    for path in glob_filesystem(project_root, project_root, pattern)? {
                        working_set.insert(path);
                    }
                }
            }
            ManifestDirective::Exclude(patterns) => {
                for pattern in patterns {
                    let candidates: Vec<PathBuf> = working_set.iter().cloned().collect();
                    for path in glob_under(project_root, project_root, pattern, candidates.into_iter())? {
                        if !is_protected(&path) {
                            working_set.remove(&path);
                        }
                    }
                }
            }
            ManifestDirective::RecursiveInclude(dir, patterns) => {
                let root = project_root.join(dir);
                for pattern in patterns {
                    let glob_pattern = format!("**/{pattern}");
                    for path in glob_filesystem(project_root, &root, &glob_pattern)? {
                        working_set.insert(path);
                    }
                }
            }
            ManifestDirective::RecursiveExclude(dir, patterns) => {
                let root = project_root.join(dir);
                for pattern in patterns {
                    let candidates: Vec<PathBuf> = working_set.iter().cloned().collect();
                    for path in glob_under(project_root, &root, pattern, candidates.into_iter())? {
                        if !is_protected(&path) {
                            working_set.remove(&path);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Rejects any path resolving outside `project_root` once symlinks are
/// followed (spec §4.5 step 4).
fn reject_escaping_paths(project_root: &Path, paths: &BTreeSet<PathBuf>) -> Result<()> {
    let canonical_root = normpath::PathExt::normalize(project_root).map_err(|source| WheyError::Io {
        path: project_root.to_path_buf(),
        source,
    })?;
    for relative in paths {
        let absolute = project_root.join(relative);
        let canonical = normpath::PathExt::normalize(absolute.as_path())
            .map_err(|source| WheyError::Io { path: absolute.clone(), source })?;
        if !canonical.as_path().starts_with(canonical_root.as_path()) {
            return Err(WheyError::file_selection(format!(
                "manifest entry escapes the project root: {}",
                relative.display()
            )));
        }
    }
    Ok(())
}

/// A single finalized, deduplicated, lexicographically sorted file list
/// (spec §3 `FileList`), relative to the project root.
pub fn select_files(
    project_root: &Path,
    source_dir: &str,
    package: &str,
    directives: &[ManifestDirective],
) -> Result<Vec<PathBuf>> {
    let mut working_set = walk_seed(project_root, source_dir, package)?;
    apply_directives(project_root, &mut working_set, directives)?;
    reject_escaping_paths(project_root, &working_set)?;
    Ok(working_set.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use tempfile::TempDir;

    fn setup_tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "content").unwrap();
        }
        dir
    }

    #[test]
    fn seed_walk_skips_pycache() {
        let dir = setup_tree(&[
            "spam/__init__.py",
            "spam/__pycache__/__init__.cpython-312.pyc",
        ]);
        let files = select_files(dir.path(), ".", "spam", &[]).unwrap();
        assert_eq!(files, vec![PathBuf::from("spam/__init__.py")]);
    }

    #[test]
    fn py_typed_survives_exclude_directive() {
        let dir = setup_tree(&["spam/__init__.py", "spam/py.typed"]);
        let directives = vec![ManifestDirective::Exclude(vec!["spam/py.typed".to_string()])];
        let files = select_files(dir.path(), ".", "spam", &directives).unwrap();
        assert!(files.contains(&PathBuf::from("spam/py.typed")));
    }

    #[test]
    fn include_directive_adds_top_level_file() {
        let dir = setup_tree(&["spam/__init__.py", "README.md"]);
        let directives = vec![ManifestDirective::Include(vec!["README.md".to_string()])];
        let files = select_files(dir.path(), ".", "spam", &directives).unwrap();
        assert!(files.contains(&PathBuf::from("README.md")));
    }

    #[test]
    fn recursive_include_scopes_to_directory() {
        let dir = setup_tree(&["spam/__init__.py", "spam/data/sample.txt", "other/sample.txt"]);
        let directives = vec![ManifestDirective::RecursiveInclude(
            "spam/data".to_string(),
            vec!["*.txt".to_string()],
        )];
        let files = select_files(dir.path(), ".", "spam", &directives).unwrap();
        assert!(files.contains(&PathBuf::from("spam/data/sample.txt")));
        assert!(!files.contains(&PathBuf::from("other/sample.txt")));
    }

    #[test]
    fn result_is_sorted() {
        let dir = setup_tree(&["spam/b.py", "spam/a.py"]);
        let files = select_files(dir.path(), ".", "spam", &[]).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("spam/a.py"), PathBuf::from("spam/b.py")]
        );
    }
}
