//! Keeps the audio thread in step with the application store.
//!
//! The runtime calls `Engine::sync` after every dispatch and `Engine::poll`
//! on every tick. Both may hand back an `EngineEvent` the runtime has to
//! answer, since only the runtime may dispatch actions.

use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, warn};

use crate::app::AppState;
use crate::library::{FileHandle, TrackId};

use super::source::{Permissions, Resolved, resolve};
use super::types::{AudioCmd, PlaybackHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The current track lives below a folder that has not been granted yet.
    NeedsPermission(FileHandle),
    /// The loaded track played to its end.
    Ended,
    /// The current track could not be read or decoded.
    Failed(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
    Empty,
    Prompting,
    Loaded,
}

pub struct Engine {
    tx: Sender<AudioCmd>,
    info: PlaybackHandle,
    track: Option<TrackId>,
    slot: Slot,
    /// Generation of the last `Load`, echoed back through `PlaybackInfo`.
    token: u64,
    playing: bool,
    volume: f32,
}

impl Engine {
    pub fn new(tx: Sender<AudioCmd>, info: PlaybackHandle) -> Self {
        Self {
            tx,
            info,
            track: None,
            slot: Slot::Empty,
            token: 0,
            playing: false,
            volume: 1.0,
        }
    }

    /// Bring the audio thread in line with `state`.
    pub fn sync(&mut self, state: &AppState, permissions: &Permissions) -> Option<EngineEvent> {
        let current = state.current_id();
        if current != self.track {
            if self.slot == Slot::Loaded {
                self.send(AudioCmd::Release);
            }
            self.track = current;
            self.slot = Slot::Empty;
            self.playing = false;
        }

        let track = state.current_track()?;

        if self.slot == Slot::Empty && state.is_playing() {
            match resolve(track, permissions) {
                Ok(Resolved::Ready(bytes)) => {
                    self.token += 1;
                    debug!(track = %track.title, token = self.token, "loading track");
                    self.send(AudioCmd::Load {
                        token: self.token,
                        bytes,
                        volume: state.volume(),
                        autoplay: true,
                    });
                    self.slot = Slot::Loaded;
                    self.playing = true;
                    self.volume = state.volume();
                }
                Ok(Resolved::NeedsPermission(handle)) => {
                    self.slot = Slot::Prompting;
                    return Some(EngineEvent::NeedsPermission(handle));
                }
                Err(err) => {
                    warn!(%err, track = %track.title, "track source unavailable");
                    return Some(EngineEvent::Failed(err.to_string()));
                }
            }
        }

        if self.slot == Slot::Loaded {
            if state.is_playing() != self.playing {
                self.playing = state.is_playing();
                self.send(if self.playing { AudioCmd::Play } else { AudioCmd::Pause });
            }
            if state.volume() != self.volume {
                self.volume = state.volume();
                self.send(AudioCmd::SetVolume(self.volume));
            }
        }
        None
    }

    /// The permission prompt was answered; the next `sync` resolves again if
    /// playback is still wanted.
    pub fn permission_answered(&mut self) {
        if self.slot == Slot::Prompting {
            self.slot = Slot::Empty;
        }
    }

    /// Check the audio thread for end-of-track and decoder failures.
    pub fn poll(&mut self) -> Option<EngineEvent> {
        if self.slot != Slot::Loaded {
            return None;
        }
        let mut info = self.info.lock().ok()?;
        if info.token != Some(self.token) {
            return None;
        }
        if let Some(err) = info.error.take() {
            self.slot = Slot::Empty;
            self.playing = false;
            return Some(EngineEvent::Failed(err));
        }
        if info.ended {
            info.ended = false;
            return Some(EngineEvent::Ended);
        }
        None
    }

    /// Play the loaded track again from the start.
    pub fn restart(&mut self) {
        if self.slot == Slot::Loaded {
            self.playing = true;
            self.send(AudioCmd::Restart);
        }
    }

    pub fn seek_by(&self, secs: i32) {
        if self.slot == Slot::Loaded {
            self.send(AudioCmd::SeekBy(secs));
        }
    }

    pub fn seek_to(&self, pos: Duration) {
        if self.slot == Slot::Loaded {
            self.send(AudioCmd::SeekTo(pos));
        }
    }

    /// Position and total length of the loaded track.
    pub fn progress(&self) -> Option<(Duration, Option<Duration>)> {
        if self.slot != Slot::Loaded {
            return None;
        }
        let info = self.info.lock().ok()?;
        (info.token == Some(self.token)).then_some((info.position, info.duration))
    }

    fn send(&self, cmd: AudioCmd) {
        if self.tx.send(cmd).is_err() {
            warn!("audio thread is gone");
        }
    }
}
