use std::fmt::Write as _;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt as _;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context as _;
use anyhow::Result;
use fs_err as fs;
use indexmap::IndexMap;
use itertools::Itertools as _;
use normpath::PathExt as _;
use tracing::debug;

use crate::archive_source::ArchiveSource;
use crate::archive_source::FileSourceData;
use crate::archive_source::GeneratedSourceData;
use crate::metadata::Metadata;
use crate::project_config::LicenseRef;

mod sdist_writer;
mod util;
mod virtual_writer;
mod wheel_writer;

pub use sdist_writer::SDistWriter;
pub use virtual_writer::VirtualWriter;
pub use wheel_writer::WheelWriter;

mod private {
    pub trait Sealed {}
}

const EMPTY: Vec<u8> = vec![];

/// Allows writing the module to a wheel or sdist archive
pub trait ModuleWriterInternal: private::Sealed {
    /// Adds an entry into the archive
    fn add_entry(&mut self, target: impl AsRef<Path>, source: ArchiveSource) -> Result<()>;
}

/// Extension trait with convenience methods for interacting with a [ModuleWriterInternal]
pub trait ModuleWriter: private::Sealed {
    /// Adds a file with data as content in target relative to the module base path while setting
    /// the appropriate unix permissions
    ///
    /// For generated files, `source` is `None`.
    fn add_bytes(
        &mut self,
        target: impl AsRef<Path>,
        source: Option<&Path>,
        data: impl Into<Vec<u8>>,
        executable: bool,
    ) -> Result<()>;

    /// Copies the source file the target path relative to the module base path while setting
    /// the given unix permissions
    fn add_file(
        &mut self,
        target: impl AsRef<Path>,
        source: impl AsRef<Path>,
        executable: bool,
    ) -> Result<()>;

    /// Add an empty file to the target path
    #[inline]
    fn add_empty_file(&mut self, target: impl AsRef<Path>) -> Result<()> {
        self.add_bytes(target, None, EMPTY, false)
    }
}

/// This blanket impl makes it impossible to overwrite the methods in [ModuleWriter]
impl<T: ModuleWriterInternal> ModuleWriter for T {
    fn add_bytes(
        &mut self,
        target: impl AsRef<Path>,
        source: Option<&Path>,
        data: impl Into<Vec<u8>>,
        executable: bool,
    ) -> Result<()> {
        self.add_entry(
            target,
            ArchiveSource::Generated(GeneratedSourceData {
                data: data.into(),
                path: source.map(ToOwned::to_owned),
                executable,
            }),
        )
    }

    fn add_file(
        &mut self,
        target: impl AsRef<Path>,
        source: impl AsRef<Path>,
        executable: bool,
    ) -> Result<()> {
        let target = target.as_ref();
        let source = source.as_ref();
        debug!("Adding {} from {}", target.display(), source.display());

        self.add_entry(
            target,
            ArchiveSource::File(FileSourceData {
                path: source.to_path_buf(),
                executable,
            }),
        )
    }
}

/// Adds every file the file-selection engine chose to the writer, preserving
/// each file's own executable bit. `archive_prefix` is prepended to each
/// archive-relative target path (the sdist builder uses `{name}-{version}/`;
/// the wheel builder uses an empty prefix).
pub fn add_selected_files(
    writer: &mut VirtualWriter<impl ModuleWriterInternal>,
    project_root: &Path,
    archive_prefix: &Path,
    files: &[PathBuf],
) -> Result<()> {
    for relative in files {
        let absolute = project_root.join(relative);
        #[cfg(unix)]
        let mode = absolute.metadata()?.permissions().mode();
        #[cfg(not(unix))]
        let mode = 0o644;
        writer
            .add_file(archive_prefix.join(relative), &absolute, permission_is_executable(mode))
            .with_context(|| format!("failed to add file from {}", absolute.display()))?;
    }
    Ok(())
}

/// Creates the .dist-info directory and fills it with all metadata files except RECORD
pub fn write_dist_info(
    writer: &mut VirtualWriter<impl ModuleWriterInternal>,
    project_root: &Path,
    metadata: &Metadata,
    license_source: Option<&LicenseRef>,
    tags: &[String],
) -> Result<PathBuf> {
    let dist_info_dir = metadata.get_dist_info_dir();

    writer.add_bytes(
        dist_info_dir.join("METADATA"),
        None,
        metadata.to_file_contents().as_bytes(),
        false,
    )?;

    writer.add_bytes(
        dist_info_dir.join("WHEEL"),
        None,
        wheel_file(tags)?.as_bytes(),
        false,
    )?;

    match license_source {
        Some(LicenseRef::File(path)) => {
            writer.add_file(dist_info_dir.join("LICENSE"), project_root.join(path), false)?;
        }
        Some(LicenseRef::Text(text)) => {
            writer.add_bytes(dist_info_dir.join("LICENSE"), None, text.as_bytes(), false)?;
        }
        None => {}
    }

    Ok(dist_info_dir)
}

/// Writes `entry_points.txt`, sectioned by group, synthesizing
/// `console_scripts`/`gui_scripts` from `scripts`/`gui_scripts` (spec §4.8).
pub fn write_entry_points(
    writer: &mut VirtualWriter<impl ModuleWriterInternal>,
    dist_info_dir: &Path,
    scripts: &IndexMap<String, String>,
    gui_scripts: &IndexMap<String, String>,
    entry_points: &IndexMap<String, IndexMap<String, String>>,
) -> Result<()> {
    let mut text = String::new();
    if !scripts.is_empty() {
        text.push_str(&entry_points_txt("console_scripts", scripts));
    }
    if !gui_scripts.is_empty() {
        text.push_str(&entry_points_txt("gui_scripts", gui_scripts));
    }
    for (group, entries) in entry_points {
        text.push_str(&entry_points_txt(group, entries));
    }
    if !text.is_empty() {
        writer.add_bytes(dist_info_dir.join("entry_points.txt"), None, text.as_bytes(), false)?;
    }
    Ok(())
}

/// Adds a `.pth` file at the wheel root that prepends `source_dir` to the
/// import search path, for editable installs (spec §4.9(a)).
pub fn write_pth(
    writer: &mut VirtualWriter<WheelWriter>,
    source_dir: &Path,
    metadata: &Metadata,
) -> Result<()> {
    let absolute_path = source_dir.normalize().with_context(|| {
        format!("source dir `{}` does not exist or is invalid", source_dir.display())
    })?;
    match absolute_path.as_path().to_str() {
        Some(python_path) => {
            let name = metadata.get_distribution_escaped();
            let target = format!("{name}.pth");
            debug!("Adding {} from {}", target, python_path);
            writer.add_bytes(target, None, python_path, false)?;
        }
        None => {
            tracing::warn!(
                "source directory path contains non-Unicode sequences; editable installs may not work"
            );
        }
    }
    Ok(())
}

fn expand_compressed_tag(tag: &str) -> impl Iterator<Item = String> + '_ {
    tag.split('-')
        .map(|component| component.split('.'))
        .multi_cartesian_product()
        .map(|components| components.join("-"))
}

fn wheel_file(tags: &[String]) -> Result<String> {
    let mut wheel_file = format!(
        "Wheel-Version: 1.0
Generator: {name}
Root-Is-Purelib: true
",
        name = env!("CARGO_PKG_NAME"),
    );

    for tag in tags {
        for expanded_tag in expand_compressed_tag(tag) {
            writeln!(wheel_file, "Tag: {expanded_tag}")?;
        }
    }

    Ok(wheel_file)
}

/// <https://packaging.python.org/specifications/entry-points/>
fn entry_points_txt(
    entry_type: &str,
    entrypoints: &IndexMap<String, String>,
) -> String {
    entrypoints
        .iter()
        .fold(format!("[{entry_type}]\n"), |text, (k, v)| {
            text + k + "=" + v + "\n"
        })
}

#[inline]
fn permission_is_executable(mode: u32) -> bool {
    (0o100 & mode) == 0o100
}

#[inline]
pub(crate) fn default_permission(executable: bool) -> u32 {
    match executable {
        true => 0o755,
        false => 0o644,
    }
}

#[cfg(test)]
mod tests {
    use super::wheel_file;

    #[test]
    fn wheel_file_compressed_tags() -> Result<(), Box<dyn std::error::Error>> {
        let expected = format!(
            "Wheel-Version: 1.0
Generator: {name}
Root-Is-Purelib: true
Tag: py2-none-any
Tag: py3-none-any
Tag: pre-expanded-tag
Tag: cp37-abi3-manylinux_2_17_x86_64
Tag: cp37-abi3-manylinux2014_x86_64
",
            name = env!("CARGO_PKG_NAME"),
        );
        let actual = wheel_file(&[
            "py2.py3-none-any".to_string(),
            "pre-expanded-tag".to_string(),
            "cp37-abi3-manylinux_2_17_x86_64.manylinux2014_x86_64".to_string(),
        ])?;
        assert_eq!(expected, actual);

        Ok(())
    }
}
