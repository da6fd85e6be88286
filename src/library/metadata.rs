//! Tag metadata extraction backed by `lofty`.
//!
//! Extraction never fails: anything lofty cannot make sense of degrades to
//! the file name and placeholder strings.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::Path;
use std::time::Duration;

use lofty::error::LoftyError;
use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use tracing::warn;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: Duration,
}

impl TrackMetadata {
    fn fallback(file_name: &str) -> Self {
        Self {
            title: file_name.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            duration: Duration::ZERO,
        }
    }
}

/// Parse embedded tags from `bytes`, falling back to `file_name` for the title.
pub fn extract(bytes: &[u8], file_name: &str) -> TrackMetadata {
    or_fallback(read_tags(Cursor::new(bytes), file_name), file_name)
}

/// Like [`extract`], but lets lofty seek through the file on disk instead of
/// loading it. Only failing to open the file is an error.
pub fn extract_from_path(path: &Path, file_name: &str) -> io::Result<TrackMetadata> {
    let reader = BufReader::new(File::open(path)?);
    Ok(or_fallback(read_tags(reader, file_name), file_name))
}

fn or_fallback(parsed: Result<TrackMetadata, LoftyError>, file_name: &str) -> TrackMetadata {
    parsed.unwrap_or_else(|e| {
        warn!(file = file_name, error = %e, "metadata parse failed");
        TrackMetadata::fallback(file_name)
    })
}

fn read_tags<R: Read + Seek>(reader: R, file_name: &str) -> Result<TrackMetadata, LoftyError> {
    let tagged = Probe::new(reader).guess_file_type()?.read()?;

    let mut meta = TrackMetadata::fallback(file_name);
    meta.duration = tagged.properties().duration();

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = non_blank(tag.title().as_deref()) {
            meta.title = v;
        }
        if let Some(v) = non_blank(tag.artist().as_deref()) {
            meta.artist = v;
        }
        if let Some(v) = non_blank(tag.album().as_deref()) {
            meta.album = v;
        }
    }

    Ok(meta)
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

/// Format label for a file: its guessed MIME type, or empty.
pub fn format_label(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}
