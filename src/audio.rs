//! Audio module: playback on a dedicated thread.
//!
//! The audio thread owns the `rodio` output stream and is driven by
//! `AudioCmd` messages. `Engine` runs on the UI thread and turns changes in
//! the application state into those commands.

mod engine;
mod player;
mod sink;
mod source;
mod thread;
mod types;

pub use engine::{Engine, EngineEvent};
pub use player::AudioPlayer;
pub use source::{PermissionState, Permissions, Resolved, SourceError, resolve};
pub use types::{AudioCmd, PlaybackHandle, PlaybackInfo};
