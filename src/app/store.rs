use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info};

use crate::library::{StoreError, Track, TrackId, TrackStore};

use super::model::{Action, AppState, View};

/// Owner of the application state and the only place it is mutated.
///
/// Persisted actions write to storage first and touch memory only once the
/// write succeeded, so a failed write leaves both sides as they were.
pub struct Store<S: TrackStore> {
    state: AppState,
    storage: S,
    rng: StdRng,
}

impl<S: TrackStore> Store<S> {
    pub fn new(storage: S) -> Self {
        Self::with_rng(storage, StdRng::from_os_rng())
    }

    pub fn with_rng(storage: S, rng: StdRng) -> Self {
        Self {
            state: AppState::default(),
            storage,
            rng,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply `action`. Storage failures are logged and returned; state is unchanged then.
    pub fn dispatch(&mut self, action: Action) -> Result<(), StoreError> {
        let name = action.name();
        let result = match action {
            Action::LoadLibrary => self.load_library(),
            Action::AddTracks(tracks) => self.add_tracks(tracks).map(|_| ()),
            Action::DeleteTrack(id) => self.delete_track(id),
            Action::ClearLibrary => self.clear_library(),
            Action::ToggleFavorite(id) => self.toggle_favorite(id),
            Action::PlayTrack(id) => {
                self.play_track(id);
                Ok(())
            }
            Action::Next => {
                self.next_track();
                Ok(())
            }
            Action::Previous => {
                self.prev_track();
                Ok(())
            }
            Action::TogglePlay => {
                if self.state.current.is_some() {
                    self.state.playing = !self.state.playing;
                }
                Ok(())
            }
            Action::SetPlaying(playing) => {
                self.state.playing = playing;
                Ok(())
            }
            Action::ToggleShuffle => {
                self.state.shuffle = !self.state.shuffle;
                Ok(())
            }
            Action::ToggleLoop => {
                self.state.repeat = !self.state.repeat;
                Ok(())
            }
            Action::SetVolume(volume) => {
                self.state.volume = volume.clamp(0.0, 1.0);
                Ok(())
            }
            Action::SetSearch(query) => {
                self.state.search = query;
                self.state.refilter();
                Ok(())
            }
            Action::SetView(view) => {
                self.set_view(view);
                Ok(())
            }
        };

        if let Err(e) = &result {
            error!(action = name, error = %e, "storage write failed; state left unchanged");
        }
        result
    }

    fn load_library(&mut self) -> Result<(), StoreError> {
        let tracks = self.storage.scan()?;
        info!(count = tracks.len(), "library loaded");
        self.state.tracks = tracks;
        self.state.refilter();
        if self.state.current.is_some_and(|id| self.state.track(id).is_none()) {
            self.state.current = None;
            self.state.playing = false;
        }
        Ok(())
    }

    /// Insert the tracks whose titles are not in the library yet. Returns how many were added.
    fn add_tracks(&mut self, incoming: Vec<Track>) -> Result<usize, StoreError> {
        let known: HashSet<&str> = self.state.tracks.iter().map(|t| t.title.as_str()).collect();
        let total = incoming.len();
        let fresh: Vec<Track> = incoming
            .into_iter()
            .filter(|t| !known.contains(t.title.as_str()))
            .collect();
        debug!(total, duplicates = total - fresh.len(), "import de-duplicated");

        if fresh.is_empty() {
            return Ok(0);
        }

        let inserted = self.storage.bulk_insert(fresh)?;
        let added = inserted.len();
        self.state.tracks.extend(inserted);
        self.set_view(View::Library);
        info!(added, "tracks added to library");
        Ok(added)
    }

    fn delete_track(&mut self, id: TrackId) -> Result<(), StoreError> {
        self.storage.delete(id)?;
        self.state.tracks.retain(|t| t.id != Some(id));
        if self.state.current == Some(id) {
            self.state.current = None;
            self.state.playing = false;
        }
        self.state.refilter();
        Ok(())
    }

    fn clear_library(&mut self) -> Result<(), StoreError> {
        self.storage.clear()?;
        self.state.tracks.clear();
        self.state.current = None;
        self.state.playing = false;
        self.state.refilter();
        Ok(())
    }

    fn toggle_favorite(&mut self, id: TrackId) -> Result<(), StoreError> {
        let Some(favorite) = self.state.track(id).map(|t| !t.favorite) else {
            return Ok(());
        };
        self.storage.set_favorite(id, favorite)?;
        if let Some(track) = self.state.track_mut(id) {
            track.favorite = favorite;
        }
        self.state.refilter();
        Ok(())
    }

    fn set_view(&mut self, view: View) {
        self.state.view = view;
        self.state.search.clear();
        self.state.refilter();
    }

    fn play_track(&mut self, id: TrackId) {
        if self.state.track(id).is_some() {
            self.state.current = Some(id);
            self.state.playing = true;
        }
    }

    fn current_position(&self) -> Option<usize> {
        let current = self.state.current?;
        self.state.visible.iter().position(|&id| id == current)
    }

    /// Advance within the visible subset. A current track that is not listed
    /// restarts from the first listed track.
    fn next_track(&mut self) {
        let len = self.state.visible.len();
        if self.state.current.is_none() || len == 0 {
            return;
        }
        let idx = if self.state.shuffle {
            self.rng.random_range(0..len)
        } else {
            match self.current_position() {
                Some(p) => (p + 1) % len,
                None => 0,
            }
        };
        self.state.current = Some(self.state.visible[idx]);
        self.state.playing = true;
    }

    /// Step back within the visible subset, ignoring shuffle. A current track
    /// that is not listed moves to the last listed track.
    fn prev_track(&mut self) {
        let len = self.state.visible.len();
        if self.state.current.is_none() || len == 0 {
            return;
        }
        let idx = match self.current_position() {
            Some(p) => (p + len - 1) % len,
            None => len - 1,
        };
        self.state.current = Some(self.state.visible[idx]);
        self.state.playing = true;
    }
}
