use super::*;
use crate::library::{SqliteStore, StoreError, Track, TrackId, TrackSource, TrackStore};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

fn t(title: &str, artist: &str) -> Track {
    Track {
        id: None,
        title: title.into(),
        artist: artist.into(),
        album: "Unknown Album".into(),
        duration: Duration::ZERO,
        format: "audio/mpeg".into(),
        path: format!("Mobile/{title}.mp3"),
        favorite: false,
        source: TrackSource::Blob(Arc::from(&b"bytes"[..])),
    }
}

fn store_with(titles: &[(&str, &str)]) -> Store<SqliteStore> {
    let mut store = Store::with_rng(
        SqliteStore::open_in_memory().unwrap(),
        StdRng::seed_from_u64(7),
    );
    let tracks = titles.iter().map(|(title, artist)| t(title, artist)).collect();
    store.dispatch(Action::AddTracks(tracks)).unwrap();
    store
}

fn titles(state: &AppState) -> Vec<String> {
    state.visible_tracks().map(|t| t.title.clone()).collect()
}

fn id_of(store: &Store<SqliteStore>, title: &str) -> TrackId {
    store
        .state()
        .tracks()
        .iter()
        .find(|t| t.title == title)
        .and_then(|t| t.id)
        .unwrap()
}

/// Storage double backed by SQLite whose calls start failing once
/// `failing` is set.
struct FlakyStorage {
    inner: SqliteStore,
    failing: Rc<Cell<bool>>,
}

impl FlakyStorage {
    fn check(&self, what: &str) -> Result<(), StoreError> {
        if self.failing.get() {
            Err(StoreError::Io(std::io::Error::other(what.to_string())))
        } else {
            Ok(())
        }
    }
}

impl TrackStore for FlakyStorage {
    fn bulk_insert(&mut self, tracks: Vec<Track>) -> Result<Vec<Track>, StoreError> {
        self.check("disk full")?;
        self.inner.bulk_insert(tracks)
    }
    fn scan(&self) -> Result<Vec<Track>, StoreError> {
        self.check("unreadable")?;
        self.inner.scan()
    }
    fn delete(&mut self, id: TrackId) -> Result<(), StoreError> {
        self.check("read-only")?;
        self.inner.delete(id)
    }
    fn clear(&mut self) -> Result<(), StoreError> {
        self.check("read-only")?;
        self.inner.clear()
    }
    fn set_favorite(&mut self, id: TrackId, favorite: bool) -> Result<(), StoreError> {
        self.check("read-only")?;
        self.inner.set_favorite(id, favorite)
    }
}

fn flaky_store(titles: &[&str]) -> (Store<FlakyStorage>, Rc<Cell<bool>>) {
    let failing = Rc::new(Cell::new(false));
    let storage = FlakyStorage {
        inner: SqliteStore::open_in_memory().unwrap(),
        failing: Rc::clone(&failing),
    };
    let mut store = Store::new(storage);
    let tracks = titles.iter().map(|title| t(title, "x")).collect();
    store.dispatch(Action::AddTracks(tracks)).unwrap();
    (store, failing)
}

#[test]
fn add_tracks_assigns_ids_and_lists_everything_in_order() {
    let store = store_with(&[("Alpha", "A"), ("Beta", "B"), ("Gamma", "C")]);
    let state = store.state();
    assert_eq!(state.tracks().len(), 3);
    assert!(state.tracks().iter().all(|t| t.id.is_some()));
    assert_eq!(titles(state), vec!["Alpha", "Beta", "Gamma"]);
}

#[test]
fn duplicate_titles_are_not_reinserted() {
    let mut store = store_with(&[("Alpha", "A"), ("Beta", "B")]);
    store
        .dispatch(Action::AddTracks(vec![
            t("Alpha", "Someone else"),
            t("alpha", "A"),
            t("Delta", "D"),
        ]))
        .unwrap();

    // Exact, case-sensitive title match only.
    let all: Vec<&str> = store
        .state()
        .tracks()
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(all, vec!["Alpha", "Beta", "alpha", "Delta"]);
}

#[test]
fn importing_the_same_batch_twice_keeps_library_size() {
    let batch = vec![t("One", "x"), t("Two", "y")];
    let mut store = store_with(&[]);
    store.dispatch(Action::AddTracks(batch.clone())).unwrap();
    store.dispatch(Action::AddTracks(batch)).unwrap();
    assert_eq!(store.state().tracks().len(), 2);
}

#[test]
fn import_switches_back_to_library_view() {
    let mut store = store_with(&[("Alpha", "A")]);
    store.dispatch(Action::SetView(View::Favorites)).unwrap();
    assert!(titles(store.state()).is_empty());

    store
        .dispatch(Action::AddTracks(vec![t("Beta", "B")]))
        .unwrap();
    assert_eq!(store.state().view(), View::Library);
    assert_eq!(titles(store.state()), vec!["Alpha", "Beta"]);
}

#[test]
fn load_library_reads_back_persisted_tracks() {
    let mut storage = SqliteStore::open_in_memory().unwrap();
    storage
        .bulk_insert(vec![t("Saved", "S"), t("Also saved", "S")])
        .unwrap();

    let mut store = Store::new(storage);
    store.dispatch(Action::LoadLibrary).unwrap();
    assert_eq!(titles(store.state()), vec!["Saved", "Also saved"]);
}

#[test]
fn search_matches_title_or_artist_case_insensitively() {
    let mut store = store_with(&[
        ("xABCx", "nobody"),
        ("plain", "The abc Band"),
        ("other", "someone"),
    ]);
    store.dispatch(Action::SetSearch("abc".into())).unwrap();
    assert_eq!(titles(store.state()), vec!["xABCx", "plain"]);

    store.dispatch(Action::SetSearch(String::new())).unwrap();
    assert_eq!(titles(store.state()), vec!["xABCx", "plain", "other"]);
}

#[test]
fn favorites_view_without_favorites_is_empty_and_library_restores_everything() {
    let mut store = store_with(&[("Alpha", "A"), ("Beta", "B")]);
    store.dispatch(Action::SetSearch("alp".into())).unwrap();
    store.dispatch(Action::SetView(View::Favorites)).unwrap();
    assert!(titles(store.state()).is_empty());
    assert_eq!(store.state().search(), "");

    store.dispatch(Action::SetSearch("zzz".into())).unwrap();
    store.dispatch(Action::SetView(View::Library)).unwrap();
    assert_eq!(store.state().search(), "");
    assert_eq!(titles(store.state()), vec!["Alpha", "Beta"]);
}

#[test]
fn search_applies_within_the_favorites_view() {
    let mut store = store_with(&[("Alpha", "A"), ("Alpine", "B"), ("Beta", "C")]);
    let alpha = id_of(&store, "Alpha");
    let beta = id_of(&store, "Beta");
    store.dispatch(Action::ToggleFavorite(alpha)).unwrap();
    store.dispatch(Action::ToggleFavorite(beta)).unwrap();

    store.dispatch(Action::SetView(View::Favorites)).unwrap();
    assert_eq!(titles(store.state()), vec!["Alpha", "Beta"]);
    store.dispatch(Action::SetSearch("ALP".into())).unwrap();
    assert_eq!(titles(store.state()), vec!["Alpha"]);
}

#[test]
fn favorite_toggled_twice_is_restored_everywhere() {
    let mut store = store_with(&[("Alpha", "A"), ("Beta", "B")]);
    let alpha = id_of(&store, "Alpha");
    store.dispatch(Action::PlayTrack(alpha)).unwrap();

    store.dispatch(Action::ToggleFavorite(alpha)).unwrap();
    let state = store.state();
    assert!(state.track(alpha).unwrap().favorite);
    assert!(state.current_track().unwrap().favorite);
    assert!(
        state
            .visible_tracks()
            .find(|t| t.id == Some(alpha))
            .unwrap()
            .favorite
    );

    store.dispatch(Action::ToggleFavorite(alpha)).unwrap();
    let state = store.state();
    assert!(!state.track(alpha).unwrap().favorite);
    assert!(!state.current_track().unwrap().favorite);
    assert!(
        !state
            .visible_tracks()
            .find(|t| t.id == Some(alpha))
            .unwrap()
            .favorite
    );
}

#[test]
fn favorite_flag_is_persisted() {
    let mut store = store_with(&[("Alpha", "A")]);
    let alpha = id_of(&store, "Alpha");
    store.dispatch(Action::ToggleFavorite(alpha)).unwrap();

    // Reloading from storage discards memory-only state.
    store.dispatch(Action::LoadLibrary).unwrap();
    assert!(store.state().track(alpha).unwrap().favorite);
}

#[test]
fn unfavoriting_in_favorites_view_removes_the_row_immediately() {
    let mut store = store_with(&[("Alpha", "A"), ("Beta", "B")]);
    let alpha = id_of(&store, "Alpha");
    let beta = id_of(&store, "Beta");
    store.dispatch(Action::ToggleFavorite(alpha)).unwrap();
    store.dispatch(Action::ToggleFavorite(beta)).unwrap();
    store.dispatch(Action::SetView(View::Favorites)).unwrap();

    store.dispatch(Action::ToggleFavorite(alpha)).unwrap();
    assert_eq!(titles(store.state()), vec!["Beta"]);
}

#[test]
fn next_without_shuffle_cycles_through_every_visible_track_once() {
    let mut store = store_with(&[("A", "x"), ("B", "x"), ("C", "x"), ("D", "x")]);
    let start = id_of(&store, "B");
    store.dispatch(Action::PlayTrack(start)).unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        store.dispatch(Action::Next).unwrap();
        seen.push(store.state().current_track().unwrap().title.clone());
    }
    assert_eq!(seen, vec!["C", "D", "A", "B"]);
    assert_eq!(store.state().current_id(), Some(start));
}

#[test]
fn previous_after_next_returns_to_the_original_track() {
    let mut store = store_with(&[("A", "x"), ("B", "x"), ("C", "x")]);
    let a = id_of(&store, "A");
    store.dispatch(Action::PlayTrack(a)).unwrap();

    store.dispatch(Action::Next).unwrap();
    store.dispatch(Action::Previous).unwrap();
    assert_eq!(store.state().current_id(), Some(a));

    // And wraps backwards from the first track.
    store.dispatch(Action::Previous).unwrap();
    assert_eq!(store.state().current_track().unwrap().title, "C");
}

#[test]
fn next_with_shuffle_stays_within_the_visible_subset() {
    let mut store = store_with(&[("Red", "x"), ("Green", "x"), ("Blue", "x"), ("Rose", "x")]);
    store.dispatch(Action::SetSearch("r".into())).unwrap();
    store.dispatch(Action::ToggleShuffle).unwrap();
    store
        .dispatch(Action::PlayTrack(id_of(&store, "Red")))
        .unwrap();

    let visible = store.state().visible_ids().to_vec();
    for _ in 0..32 {
        store.dispatch(Action::Next).unwrap();
        let current = store.state().current_id().unwrap();
        assert!(visible.contains(&current));
        assert!(store.state().is_playing());
    }
}

#[test]
fn next_and_previous_are_no_ops_without_a_current_track() {
    let mut store = store_with(&[("A", "x"), ("B", "x")]);
    store.dispatch(Action::Next).unwrap();
    store.dispatch(Action::Previous).unwrap();
    assert_eq!(store.state().current_id(), None);
    assert!(!store.state().is_playing());
}

#[test]
fn hidden_current_track_falls_back_to_first_or_last_visible() {
    let mut store = store_with(&[("Alpha", "x"), ("Beta", "x"), ("Gamma", "x")]);
    let alpha = id_of(&store, "Alpha");
    let beta = id_of(&store, "Beta");
    let gamma = id_of(&store, "Gamma");
    store.dispatch(Action::ToggleFavorite(beta)).unwrap();
    store.dispatch(Action::ToggleFavorite(gamma)).unwrap();
    store.dispatch(Action::PlayTrack(alpha)).unwrap();
    store.dispatch(Action::SetView(View::Favorites)).unwrap();

    store.dispatch(Action::Next).unwrap();
    assert_eq!(store.state().current_id(), Some(beta));

    store.dispatch(Action::PlayTrack(alpha)).unwrap();
    store.dispatch(Action::Previous).unwrap();
    assert_eq!(store.state().current_id(), Some(gamma));
}

#[test]
fn deleting_the_current_track_stops_playback() {
    let mut store = store_with(&[("Alpha", "x"), ("Beta", "x")]);
    let alpha = id_of(&store, "Alpha");
    store.dispatch(Action::PlayTrack(alpha)).unwrap();
    assert!(store.state().is_playing());

    store.dispatch(Action::DeleteTrack(alpha)).unwrap();
    assert_eq!(store.state().current_id(), None);
    assert!(!store.state().is_playing());
    assert_eq!(titles(store.state()), vec!["Beta"]);

    store.dispatch(Action::LoadLibrary).unwrap();
    assert_eq!(store.state().tracks().len(), 1);
}

#[test]
fn lookups_by_id_survive_deletes_and_reloads() {
    let mut store = store_with(&[("A", "x"), ("B", "x"), ("C", "x")]);
    let (a, c) = (id_of(&store, "A"), id_of(&store, "C"));

    store.dispatch(Action::DeleteTrack(a)).unwrap();
    assert!(store.state().track(a).is_none());
    assert_eq!(store.state().track(c).map(|t| t.title.as_str()), Some("C"));

    store.dispatch(Action::ToggleFavorite(c)).unwrap();
    store.dispatch(Action::LoadLibrary).unwrap();
    assert!(store.state().track(c).is_some_and(|t| t.favorite));
    assert_eq!(titles(store.state()), vec!["B", "C"]);
}

#[test]
fn clear_library_empties_memory_and_storage() {
    let mut store = store_with(&[("Alpha", "x"), ("Beta", "x")]);
    store
        .dispatch(Action::PlayTrack(id_of(&store, "Beta")))
        .unwrap();
    store.dispatch(Action::ClearLibrary).unwrap();

    assert!(!store.state().has_tracks());
    assert!(store.state().visible_ids().is_empty());
    assert_eq!(store.state().current_id(), None);
    assert!(!store.state().is_playing());

    store.dispatch(Action::LoadLibrary).unwrap();
    assert!(!store.state().has_tracks());
}

#[test]
fn transport_flags_and_volume() {
    let mut store = store_with(&[("Alpha", "x")]);
    store.dispatch(Action::TogglePlay).unwrap();
    assert!(!store.state().is_playing(), "nothing selected yet");

    store
        .dispatch(Action::PlayTrack(id_of(&store, "Alpha")))
        .unwrap();
    store.dispatch(Action::TogglePlay).unwrap();
    assert!(!store.state().is_playing());
    store.dispatch(Action::SetPlaying(true)).unwrap();
    assert!(store.state().is_playing());

    store.dispatch(Action::ToggleLoop).unwrap();
    store.dispatch(Action::ToggleShuffle).unwrap();
    assert!(store.state().repeat());
    assert!(store.state().shuffle());

    store.dispatch(Action::SetVolume(1.7)).unwrap();
    assert_eq!(store.state().volume(), 1.0);
    store.dispatch(Action::SetVolume(-0.2)).unwrap();
    assert_eq!(store.state().volume(), 0.0);
}

#[test]
fn failed_writes_leave_memory_untouched() {
    let (mut store, failing) = flaky_store(&["Alpha", "Beta"]);
    let alpha = store.state().tracks()[0].id.unwrap();
    store.dispatch(Action::ToggleFavorite(alpha)).unwrap();
    store.dispatch(Action::PlayTrack(alpha)).unwrap();

    let tracks = store.state().tracks().to_vec();
    let visible = store.state().visible_ids().to_vec();
    failing.set(true);

    let attempts = [
        Action::LoadLibrary,
        Action::AddTracks(vec![t("Gamma", "y")]),
        Action::DeleteTrack(alpha),
        Action::ToggleFavorite(alpha),
        Action::ClearLibrary,
    ];
    for action in attempts {
        let name = action.name();
        assert!(store.dispatch(action).is_err(), "{name} should fail");
        let state = store.state();
        assert_eq!(state.tracks(), tracks.as_slice(), "{name} changed tracks");
        assert_eq!(state.visible_ids(), visible.as_slice(), "{name} changed the listing");
        assert!(state.tracks()[0].favorite, "{name} changed the favorite flag");
        assert_eq!(state.current_id(), Some(alpha), "{name} changed current");
        assert!(state.is_playing(), "{name} stopped playback");
    }

    failing.set(false);
    store.dispatch(Action::DeleteTrack(alpha)).unwrap();
    assert_eq!(store.state().tracks().len(), 1);
    assert_eq!(store.state().current_id(), None);
}

#[test]
fn browse_cursor_wraps_and_follows_current() {
    let mut store = store_with(&[("A", "x"), ("B", "x"), ("C", "x")]);
    let mut browse = Browse::default();

    browse.up(3);
    assert_eq!(browse.cursor, 2);
    browse.down(3);
    assert_eq!(browse.cursor, 0);

    store
        .dispatch(Action::PlayTrack(id_of(&store, "B")))
        .unwrap();
    browse.follow_current(store.state());
    assert_eq!(browse.selected_id(store.state()), Some(id_of(&store, "B")));

    browse.cursor = 10;
    browse.clamp(3);
    assert_eq!(browse.cursor, 2);
}

#[test]
fn browse_input_round_trip() {
    let mut browse = Browse::default();
    assert!(!browse.input_focused());
    browse.begin_input(InputKind::Search, "ab");
    assert!(browse.input_focused());
    browse.input.push('c');
    assert_eq!(browse.finish_input(), "abc");
    assert_eq!(browse.mode, Mode::Normal);
}
