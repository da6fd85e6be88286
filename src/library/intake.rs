use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::metadata::{TrackMetadata, extract, extract_from_path, format_label};
use super::model::{FileHandle, Track, TrackSource};

/// Path prefix recorded for loose files, which have no enclosing folder handle.
pub const LOOSE_FILES_PREFIX: &str = "Mobile";

/// A user-initiated import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRequest {
    /// A folder, walked recursively; tracks keep a handle for later re-reads.
    Directory(PathBuf),
    /// Individual files; their bytes are kept on the track.
    Files(Vec<PathBuf>),
}

/// Run `request` to completion. A cancelled or unusable selection yields no tracks.
pub fn run_import(request: &ImportRequest, settings: &LibrarySettings) -> Vec<Track> {
    match request {
        ImportRequest::Directory(dir) => import_directory(dir, settings),
        ImportRequest::Files(files) => import_files(files, settings),
    }
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `<root-name>/<relative components...>` with `/` separators on every platform.
fn display_path(root: &Path, file: &Path) -> String {
    let mut parts = vec![file_name_of(root)];
    if let Ok(rel) = file.strip_prefix(root) {
        parts.extend(rel.iter().map(|c| c.to_string_lossy().into_owned()));
    } else {
        parts.push(file_name_of(file));
    }
    parts.join("/")
}

fn build_track(meta: TrackMetadata, file_name: &str, path: String, source: TrackSource) -> Track {
    Track {
        id: None,
        title: meta.title,
        artist: meta.artist,
        album: meta.album,
        duration: meta.duration,
        format: format_label(file_name),
        path,
        favorite: false,
        source,
    }
}

/// Walk `dir` recursively and build a handle-backed track for every audio file.
pub fn import_directory(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    if !dir.is_dir() {
        info!(dir = %dir.display(), "folder selection unavailable; nothing imported");
        return Vec::new();
    }
    let root = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    info!(dir = %root.display(), "scanning folder");

    let mut walker = WalkDir::new(&root)
        .follow_links(settings.follow_links)
        .sort_by_file_name();
    if let Some(d) = settings.max_depth {
        walker = walker.max_depth(d);
    }

    let mut tracks: Vec<Track> = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let file_name = file_name_of(path);
        let meta = match extract_from_path(path, &file_name) {
            Ok(m) => m,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let source = TrackSource::Handle(FileHandle::new(&root, path));
        tracks.push(build_track(
            meta,
            &file_name,
            display_path(&root, path),
            source,
        ));
    }

    debug!(count = tracks.len(), "folder scan finished");
    tracks
}

/// Build blob-backed tracks for the audio files among `files`, without recursion.
pub fn import_files(files: &[PathBuf], settings: &LibrarySettings) -> Vec<Track> {
    info!(count = files.len(), "processing picked files");

    let mut tracks: Vec<Track> = Vec::new();
    for path in files {
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }
        let bytes: Arc<[u8]> = match fs::read(path) {
            Ok(b) => b.into(),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let file_name = file_name_of(path);
        let display = format!("{LOOSE_FILES_PREFIX}/{file_name}");
        tracks.push(build_track(
            extract(&bytes, &file_name),
            &file_name,
            display,
            TrackSource::Blob(bytes.clone()),
        ));
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.wav"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.M4A"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn display_path_joins_root_name_and_relative_components() {
        let root = Path::new("/music/Albums");
        let file = Path::new("/music/Albums/Band/Record/01.mp3");
        assert_eq!(display_path(root, file), "Albums/Band/Record/01.mp3");
    }

    #[test]
    fn import_directory_recurses_and_skips_non_audio() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"image").unwrap();
        fs::write(sub.join("a.ogg"), b"not a real ogg").unwrap();
        fs::write(sub.join("notes.txt"), b"ignore me").unwrap();

        let tracks = import_directory(dir.path(), &LibrarySettings::default());
        let root_name = file_name_of(&fs::canonicalize(dir.path()).unwrap());

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "b.MP3");
        assert_eq!(tracks[0].path, format!("{root_name}/b.MP3"));
        assert_eq!(tracks[1].title, "a.ogg");
        assert_eq!(tracks[1].path, format!("{root_name}/sub/a.ogg"));
        for t in &tracks {
            assert!(t.id.is_none());
            assert!(!t.favorite);
            assert_eq!(t.artist, crate::library::metadata::UNKNOWN_ARTIST);
            assert!(matches!(t.source, TrackSource::Handle(_)));
        }
    }

    #[test]
    fn import_directory_handles_point_at_the_picked_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.wav"), b"riff?").unwrap();

        let tracks = import_directory(dir.path(), &LibrarySettings::default());
        let root = fs::canonicalize(dir.path()).unwrap();
        match &tracks[0].source {
            TrackSource::Handle(h) => {
                assert_eq!(h.root(), root.as_path());
                assert_eq!(h.file(), root.join("x.wav").as_path());
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn import_directory_of_missing_folder_is_empty() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone");
        assert!(import_directory(&gone, &LibrarySettings::default()).is_empty());
    }

    #[test]
    fn import_directory_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let tracks = import_directory(dir.path(), &settings);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "visible.mp3");
    }

    #[test]
    fn import_directory_respects_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        fs::write(d1.join("one.mp3"), b"not real").unwrap();
        fs::write(d2.join("two.mp3"), b"not real").unwrap();

        // WalkDir depth counts root as 0, children as 1, grandchildren as 2...
        let settings = LibrarySettings {
            max_depth: Some(2),
            ..LibrarySettings::default()
        };
        let titles: Vec<String> = import_directory(dir.path(), &settings)
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert!(titles.contains(&"root.mp3".to_string()));
        assert!(titles.contains(&"one.mp3".to_string()));
        assert!(!titles.contains(&"two.mp3".to_string()));
    }

    #[test]
    fn import_files_keeps_bytes_and_uses_loose_prefix() {
        let dir = tempdir().unwrap();
        let song = dir.path().join("song.flac");
        let text = dir.path().join("readme.md");
        let nested = dir.path().join("folder.mp3");
        fs::write(&song, b"fLaC-ish").unwrap();
        fs::write(&text, b"# hi").unwrap();
        fs::create_dir_all(&nested).unwrap();

        let tracks = import_files(
            &[song.clone(), text, nested, dir.path().join("missing.mp3")],
            &LibrarySettings::default(),
        );

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].path, "Mobile/song.flac");
        match &tracks[0].source {
            TrackSource::Blob(bytes) => assert_eq!(&bytes[..], b"fLaC-ish"),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn run_import_dispatches_on_request_kind() {
        let dir = tempdir().unwrap();
        let song = dir.path().join("one.mp3");
        fs::write(&song, b"x").unwrap();
        let settings = LibrarySettings::default();

        let from_dir = run_import(&ImportRequest::Directory(dir.path().to_path_buf()), &settings);
        let from_files = run_import(&ImportRequest::Files(vec![song]), &settings);

        assert!(matches!(from_dir[0].source, TrackSource::Handle(_)));
        assert!(matches!(from_files[0].source, TrackSource::Blob(_)));
        assert!(run_import(&ImportRequest::Files(Vec::new()), &settings).is_empty());
    }
}
