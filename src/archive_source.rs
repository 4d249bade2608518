use std::path::PathBuf;

#[derive(Debug, Clone)]
pub(crate) enum ArchiveSource {
    Generated(GeneratedSourceData),
    File(FileSourceData),
}

impl ArchiveSource {
    pub(crate) fn executable(&self) -> bool {
        match self {
            ArchiveSource::Generated(data) => data.executable,
            ArchiveSource::File(data) => data.executable,
        }
    }

    pub(crate) fn path(&self) -> Option<&std::path::Path> {
        match self {
            ArchiveSource::Generated(data) => data.path.as_deref(),
            ArchiveSource::File(data) => Some(&data.path),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GeneratedSourceData {
    pub(crate) data: Vec<u8>,
    pub(crate) path: Option<PathBuf>,
    pub(crate) executable: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct FileSourceData {
    pub(crate) path: PathBuf,
    pub(crate) executable: bool,
}
