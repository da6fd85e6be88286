//! Turning a track's stored source into playable bytes.
//!
//! Loose files carry their bytes with them. Folder imports only keep a
//! handle, and reading through it needs a session grant for the folder the
//! user picked.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::library::{FileHandle, Track, TrackSource};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    /// The user has to be asked first.
    Prompt,
}

/// Folders the user has allowed reads below, for this session only.
#[derive(Debug, Default)]
pub struct Permissions {
    granted: HashSet<PathBuf>,
}

impl Permissions {
    pub fn query(&self, handle: &FileHandle) -> PermissionState {
        if self.granted.contains(handle.root()) {
            PermissionState::Granted
        } else {
            PermissionState::Prompt
        }
    }

    pub fn grant(&mut self, root: &Path) {
        if self.granted.insert(root.to_path_buf()) {
            debug!(root = %root.display(), "read access granted");
        }
    }
}

/// Outcome of resolving a track's bytes.
#[derive(Debug)]
pub enum Resolved {
    Ready(Arc<[u8]>),
    NeedsPermission(FileHandle),
}

pub fn resolve(track: &Track, permissions: &Permissions) -> Result<Resolved, SourceError> {
    match &track.source {
        TrackSource::Blob(bytes) => Ok(Resolved::Ready(bytes.clone())),
        TrackSource::Handle(handle) => match permissions.query(handle) {
            PermissionState::Prompt => Ok(Resolved::NeedsPermission(handle.clone())),
            PermissionState::Granted => {
                let bytes = std::fs::read(handle.file()).map_err(|source| SourceError::Read {
                    path: handle.file().to_path_buf(),
                    source,
                })?;
                Ok(Resolved::Ready(bytes.into()))
            }
        },
    }
}
