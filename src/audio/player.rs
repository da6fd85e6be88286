use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info};

use super::engine::Engine;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, PlaybackHandle, PlaybackInfo};

/// Owns the audio thread for the lifetime of the app.
///
/// The UI side never talks to the thread directly; it goes through the
/// `Engine` handed out by [`AudioPlayer::engine`].
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    info: PlaybackHandle,
    thread: Option<JoinHandle<()>>,
}

impl AudioPlayer {
    pub fn start() -> Self {
        let (tx, rx) = mpsc::channel();
        let info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));
        let thread = spawn_audio_thread(rx, Arc::clone(&info));
        Self {
            tx,
            info,
            thread: Some(thread),
        }
    }

    pub fn engine(&self) -> Engine {
        Engine::new(self.tx.clone(), Arc::clone(&self.info))
    }

    /// Fade out whatever is playing, then wait for the thread to exit.
    pub fn shutdown(mut self, fade_out: Duration) {
        let fade_out_ms = u64::try_from(fade_out.as_millis()).unwrap_or(u64::MAX);
        if self.tx.send(AudioCmd::Quit { fade_out_ms }).is_err() {
            info!("audio thread already stopped");
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("audio thread panicked");
            }
        }
    }
}
