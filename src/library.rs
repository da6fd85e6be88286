//! Music library: track model, file intake, tag extraction and persistence.

mod intake;
mod metadata;
mod model;
mod store;

pub use intake::{ImportRequest, LOOSE_FILES_PREFIX, import_directory, import_files, run_import};
pub use model::{FileHandle, Track, TrackId, TrackSource};
pub use store::{SqliteStore, StoreError, TrackStore};
