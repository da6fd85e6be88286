//! Application model types: `AppState`, `View` and the `Action` vocabulary.
//!
//! `AppState` is read-only outside this module; every change goes through
//! `Store::dispatch`.

use std::collections::HashMap;

use crate::library::{Track, TrackId};

/// Which slice of the library is listed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Library,
    Favorites,
}

impl View {
    pub fn toggled(self) -> Self {
        match self {
            Self::Library => Self::Favorites,
            Self::Favorites => Self::Library,
        }
    }
}

/// Every state change the application store knows how to apply.
#[derive(Debug, Clone)]
pub enum Action {
    LoadLibrary,
    AddTracks(Vec<Track>),
    DeleteTrack(TrackId),
    ClearLibrary,
    ToggleFavorite(TrackId),
    PlayTrack(TrackId),
    Next,
    Previous,
    TogglePlay,
    SetPlaying(bool),
    ToggleShuffle,
    ToggleLoop,
    SetVolume(f32),
    SetSearch(String),
    SetView(View),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadLibrary => "load-library",
            Self::AddTracks(_) => "add-tracks",
            Self::DeleteTrack(_) => "delete-track",
            Self::ClearLibrary => "clear-library",
            Self::ToggleFavorite(_) => "toggle-favorite",
            Self::PlayTrack(_) => "play-track",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::TogglePlay => "toggle-play",
            Self::SetPlaying(_) => "set-playing",
            Self::ToggleShuffle => "toggle-shuffle",
            Self::ToggleLoop => "toggle-loop",
            Self::SetVolume(_) => "set-volume",
            Self::SetSearch(_) => "set-search",
            Self::SetView(_) => "set-view",
        }
    }
}

/// In-memory library and playback state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub(super) tracks: Vec<Track>,
    /// Position of each id in `tracks`; rebuilt by `refilter`.
    index: HashMap<TrackId, usize>,
    pub(super) visible: Vec<TrackId>,
    pub(super) view: View,
    pub(super) search: String,
    pub(super) current: Option<TrackId>,
    pub(super) playing: bool,
    pub(super) shuffle: bool,
    pub(super) repeat: bool,
    pub(super) volume: f32,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            index: HashMap::new(),
            visible: Vec::new(),
            view: View::Library,
            search: String::new(),
            current: None,
            playing: false,
            shuffle: false,
            repeat: false,
            volume: 1.0,
        }
    }
}

impl AppState {
    /// The full collection in insertion order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Ids of the tracks currently listed, in collection order.
    pub fn visible_ids(&self) -> &[TrackId] {
        &self.visible
    }

    pub fn visible_tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.visible.iter().filter_map(|id| self.track(*id))
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.index.get(&id).and_then(|&i| self.tracks.get(i))
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn current_id(&self) -> Option<TrackId> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|id| self.track(id))
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub(super) fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        let i = *self.index.get(&id)?;
        self.tracks.get_mut(i)
    }

    /// Recompute the id index and the visible subset. Must run after every
    /// change to `tracks`.
    pub(super) fn refilter(&mut self) {
        self.index = self
            .tracks
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.id.map(|id| (id, i)))
            .collect();
        let query = self.search.to_lowercase();
        self.visible = self
            .tracks
            .iter()
            .filter(|t| matches_view(t, self.view) && matches_search(t, &query))
            .filter_map(|t| t.id)
            .collect();
    }
}

fn matches_view(track: &Track, view: View) -> bool {
    match view {
        View::Library => true,
        View::Favorites => track.favorite,
    }
}

/// Case-insensitive substring match on title or artist; `query_lower` must be lowercase.
pub(super) fn matches_search(track: &Track, query_lower: &str) -> bool {
    query_lower.is_empty()
        || track.title.to_lowercase().contains(query_lower)
        || track.artist.to_lowercase().contains(query_lower)
}
