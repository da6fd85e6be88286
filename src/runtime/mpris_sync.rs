use crate::app::AppState;
use crate::mpris::{MprisHandle, PlaybackStatus};

pub fn playback_status(state: &AppState) -> PlaybackStatus {
    match (state.current_id(), state.is_playing()) {
        (None, _) => PlaybackStatus::Stopped,
        (Some(_), true) => PlaybackStatus::Playing,
        (Some(_), false) => PlaybackStatus::Paused,
    }
}

pub fn update_mpris(mpris: &MprisHandle, state: &AppState) {
    mpris.set_track_metadata(state.current_id(), state.current_track());
    mpris.set_playback(playback_status(state));
}
