//! Persistent track table backed by SQLite.
//!
//! One table keyed by an auto-incremented integer. The title/artist/album/path
//! indices are created for future queries; all filtering happens in memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{Connection, Row, params};
use thiserror::Error;
use tracing::debug;

use super::model::{FileHandle, Track, TrackId, TrackSource};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot prepare database location: {0}")]
    Io(#[from] std::io::Error),
    #[error("track {id} is corrupt: {reason}")]
    CorruptRecord { id: i64, reason: &'static str },
}

/// Storage operations the application store relies on.
pub trait TrackStore {
    /// Insert `tracks` in one transaction and return them with their new keys.
    fn bulk_insert(&mut self, tracks: Vec<Track>) -> Result<Vec<Track>, StoreError>;
    /// Every stored track, in key order.
    fn scan(&self) -> Result<Vec<Track>, StoreError>;
    fn delete(&mut self, id: TrackId) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
    fn set_favorite(&mut self, id: TrackId, favorite: bool) -> Result<(), StoreError>;
}

const SOURCE_BLOB: &str = "blob";
const SOURCE_HANDLE: &str = "handle";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        debug!(path = %path.display(), "library database opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tracks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                album TEXT NOT NULL,
                path TEXT NOT NULL,
                favorite INTEGER NOT NULL DEFAULT 0,
                duration REAL NOT NULL DEFAULT 0,
                format TEXT NOT NULL DEFAULT '',
                source_kind TEXT NOT NULL,
                source_root TEXT,
                source_file TEXT,
                source_blob BLOB
            );
            CREATE INDEX IF NOT EXISTS tracks_title ON tracks(title);
            CREATE INDEX IF NOT EXISTS tracks_artist ON tracks(artist);
            CREATE INDEX IF NOT EXISTS tracks_album ON tracks(album);
            CREATE INDEX IF NOT EXISTS tracks_path ON tracks(path);",
        )
    }
}

fn track_from_row(row: &Row<'_>) -> Result<Track, StoreError> {
    let id: i64 = row.get(0)?;
    let kind: String = row.get(8)?;
    let root: Option<String> = row.get(9)?;
    let file: Option<String> = row.get(10)?;
    let blob: Option<Vec<u8>> = row.get(11)?;

    let source = match (kind.as_str(), root, file, blob) {
        (SOURCE_BLOB, _, _, Some(bytes)) => TrackSource::Blob(Arc::from(bytes)),
        (SOURCE_HANDLE, Some(root), Some(file), _) => {
            TrackSource::Handle(FileHandle::new(PathBuf::from(root), PathBuf::from(file)))
        }
        _ => {
            return Err(StoreError::CorruptRecord {
                id,
                reason: "source columns do not match source kind",
            });
        }
    };

    let duration: f64 = row.get(6)?;
    Ok(Track {
        id: Some(TrackId(id)),
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get(3)?,
        path: row.get(4)?,
        favorite: row.get(5)?,
        duration: Duration::try_from_secs_f64(duration).unwrap_or_default(),
        format: row.get(7)?,
        source,
    })
}

impl TrackStore for SqliteStore {
    fn bulk_insert(&mut self, mut tracks: Vec<Track>) -> Result<Vec<Track>, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tracks (title, artist, album, path, favorite, duration, format,
                    source_kind, source_root, source_file, source_blob)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for track in tracks.iter_mut() {
                let (kind, root, file, blob) = match &track.source {
                    TrackSource::Blob(bytes) => (SOURCE_BLOB, None, None, Some(&bytes[..])),
                    TrackSource::Handle(h) => (
                        SOURCE_HANDLE,
                        Some(h.root().to_string_lossy().into_owned()),
                        Some(h.file().to_string_lossy().into_owned()),
                        None,
                    ),
                };
                stmt.execute(params![
                    track.title,
                    track.artist,
                    track.album,
                    track.path,
                    track.favorite,
                    track.duration.as_secs_f64(),
                    track.format,
                    kind,
                    root,
                    file,
                    blob,
                ])?;
                track.id = Some(TrackId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        Ok(tracks)
    }

    fn scan(&self) -> Result<Vec<Track>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, artist, album, path, favorite, duration, format,
                source_kind, source_root, source_file, source_blob
             FROM tracks ORDER BY id ASC",
        )?;
        let mut rows = stmt.query([])?;

        let mut tracks = Vec::new();
        while let Some(row) = rows.next()? {
            tracks.push(track_from_row(row)?);
        }
        Ok(tracks)
    }

    fn delete(&mut self, id: TrackId) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM tracks WHERE id = ?1", params![id.0])?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM tracks", [])?;
        Ok(())
    }

    fn set_favorite(&mut self, id: TrackId, favorite: bool) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE tracks SET favorite = ?1 WHERE id = ?2",
            params![favorite, id.0],
        )?;
        Ok(())
    }
}
