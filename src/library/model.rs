use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Key assigned by the persistent store when a track is inserted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub i64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A revisitable reference to a file below a folder the user picked.
///
/// Reading through a handle is gated on a read grant for `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    root: PathBuf,
    file: PathBuf,
}

impl FileHandle {
    pub fn new(root: impl Into<PathBuf>, file: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file: file.into(),
        }
    }

    /// The picked folder this handle was obtained from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Where a track's bytes come from.
#[derive(Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// Bytes kept in memory (loose files picked one by one).
    Blob(Arc<[u8]>),
    /// A permission-gated reference to a file on disk.
    Handle(FileHandle),
}

impl fmt::Debug for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob(bytes) => write!(f, "Blob({} bytes)", bytes.len()),
            Self::Handle(h) => f.debug_tuple("Handle").field(h).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: Option<TrackId>,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: Duration,
    /// MIME type guessed from the file name, empty when unknown.
    pub format: String,
    /// `<folder>/<sub>/<file>` for folder imports, `Mobile/<file>` for loose files.
    pub path: String,
    pub favorite: bool,
    pub source: TrackSource,
}
