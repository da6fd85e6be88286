use tracing::warn;

use crate::app::{Action, Store};
use crate::config;
use crate::library::TrackStore;

/// Apply the configured playback defaults to a freshly loaded store.
pub fn apply_playback_defaults<S: TrackStore>(store: &mut Store<S>, settings: &config::Settings) {
    let mut defaults = vec![Action::SetVolume(settings.audio.volume)];
    if settings.playback.shuffle && !store.state().shuffle() {
        defaults.push(Action::ToggleShuffle);
    }
    if settings.playback.repeat && !store.state().repeat() {
        defaults.push(Action::ToggleLoop);
    }

    for action in defaults {
        if let Err(err) = store.dispatch(action) {
            warn!(%err, "could not apply playback default");
        }
    }
}
