//! Background imports.
//!
//! Walking a folder and reading tags can take a while, so each request runs
//! on its own thread and the event loop collects the results.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::info;

use crate::config::LibrarySettings;
use crate::library::{ImportRequest, Track, run_import};

#[derive(Debug)]
pub struct ImportDone {
    pub request: ImportRequest,
    pub tracks: Vec<Track>,
}

pub struct Importer {
    settings: LibrarySettings,
    tx: Sender<ImportDone>,
    rx: Receiver<ImportDone>,
}

impl Importer {
    pub fn new(settings: LibrarySettings) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { settings, tx, rx }
    }

    pub fn spawn(&self, request: ImportRequest) {
        let settings = self.settings.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let tracks = run_import(&request, &settings);
            info!(?request, found = tracks.len(), "import finished");
            let _ = tx.send(ImportDone { request, tracks });
        });
    }

    /// Finished imports, without blocking.
    pub fn finished(&self) -> Vec<ImportDone> {
        self.rx.try_iter().collect()
    }
}

/// Split command-line paths into import requests: each directory on its
/// own, all plain files together.
pub fn requests_from_args<I>(args: I) -> Vec<ImportRequest>
where
    I: IntoIterator<Item = std::path::PathBuf>,
{
    let mut requests = Vec::new();
    let mut files = Vec::new();
    for path in args {
        if path.is_dir() {
            requests.push(ImportRequest::Directory(path));
        } else {
            files.push(path);
        }
    }
    if !files.is_empty() {
        requests.push(ImportRequest::Files(files));
    }
    requests
}

/// Parse the comma-separated list typed into the "open files" prompt.
pub fn parse_file_list(input: &str) -> Vec<std::path::PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(std::path::PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn args_split_into_folder_and_file_requests() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("album");
        fs::create_dir(&sub).unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.flac");

        let requests = requests_from_args(vec![a.clone(), sub.clone(), b.clone()]);
        assert_eq!(
            requests,
            vec![
                ImportRequest::Directory(sub),
                ImportRequest::Files(vec![a, b])
            ]
        );
        assert!(requests_from_args(Vec::new()).is_empty());
    }

    #[test]
    fn file_list_ignores_blanks() {
        assert_eq!(
            parse_file_list(" /m/a.mp3, ,/m/b.mp3,"),
            vec![PathBuf::from("/m/a.mp3"), PathBuf::from("/m/b.mp3")]
        );
        assert!(parse_file_list("   ").is_empty());
    }

    #[test]
    fn spawned_import_reports_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.mp3"), b"not really audio").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let importer = Importer::new(LibrarySettings::default());
        importer.spawn(ImportRequest::Directory(dir.path().to_path_buf()));

        let done = importer
            .rx
            .recv_timeout(Duration::from_secs(10))
            .unwrap();
        assert_eq!(done.tracks.len(), 1);
        assert_eq!(done.tracks[0].title, "one.mp3");
    }
}
