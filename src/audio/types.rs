//! Audio-related small types and handles.
//!
//! This module defines the commands understood by the audio thread and the
//! playback info it publishes back to the UI.

use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
pub enum AudioCmd {
    /// Decode `bytes` into a fresh sink, replacing whatever was loaded.
    Load {
        token: u64,
        bytes: Arc<[u8]>,
        volume: f32,
        autoplay: bool,
    },
    /// Stop and drop the loaded stream.
    Release,
    Play,
    Pause,
    /// Jump to an absolute position.
    SeekTo(Duration),
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i32),
    /// Play the loaded stream again from the start.
    Restart,
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information shared with the UI.
pub struct PlaybackInfo {
    /// Load generation the rest of the fields describe.
    pub token: Option<u64>,
    pub position: Duration,
    /// Total length reported by the decoder, when known.
    pub duration: Option<Duration>,
    pub playing: bool,
    /// Set once when the loaded stream runs out.
    pub ended: bool,
    /// Decoder failure for the last load.
    pub error: Option<String>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
