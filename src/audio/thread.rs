use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use super::sink::create_sink_at;
use super::types::{AudioCmd, PlaybackHandle};

const TICK: Duration = Duration::from_millis(200);

/// The stream currently loaded on the output device.
struct Deck {
    token: u64,
    bytes: Arc<[u8]>,
    sink: Sink,
    /// Where the sink's source started, relative to the track start.
    offset: Duration,
    duration: Option<Duration>,
    paused: bool,
    ended: bool,
}

impl Deck {
    fn position(&self) -> Duration {
        self.offset + self.sink.get_pos()
    }
}

pub(super) fn spawn_audio_thread(rx: Receiver<AudioCmd>, playback_info: PlaybackHandle) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "no audio output device, playback disabled");
                // Keep accepting commands so senders never see a closed channel mid-session.
                for cmd in rx {
                    if matches!(cmd, AudioCmd::Quit { .. }) {
                        break;
                    }
                }
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let mut deck: Option<Deck> = None;
        let mut volume = 1.0_f32;

        loop {
            match rx.recv_timeout(TICK) {
                Ok(AudioCmd::Quit { fade_out_ms }) => {
                    if let Some(d) = deck.as_ref() {
                        if !d.paused && !d.ended {
                            fade_out_sink(&d.sink, volume, fade_out_ms);
                        }
                        d.sink.stop();
                    }
                    if let Ok(mut info) = playback_info.lock() {
                        info.playing = false;
                    }
                    break;
                }
                Ok(cmd) => handle(cmd, &stream, &mut deck, &mut volume, &playback_info),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            publish(&mut deck, &playback_info);
        }
        debug!("audio thread finished");
    })
}

fn handle(
    cmd: AudioCmd,
    stream: &OutputStream,
    deck: &mut Option<Deck>,
    volume: &mut f32,
    playback_info: &PlaybackHandle,
) {
    match cmd {
        AudioCmd::Load {
            token,
            bytes,
            volume: v,
            autoplay,
        } => {
            if let Some(old) = deck.take() {
                old.sink.stop();
            }
            *volume = v;
            match create_sink_at(stream, bytes.clone(), Duration::ZERO) {
                Ok((sink, duration)) => {
                    sink.set_volume(v);
                    if autoplay {
                        sink.play();
                    }
                    *deck = Some(Deck {
                        token,
                        bytes,
                        sink,
                        offset: Duration::ZERO,
                        duration,
                        paused: !autoplay,
                        ended: false,
                    });
                    if let Ok(mut info) = playback_info.lock() {
                        info.token = Some(token);
                        info.position = Duration::ZERO;
                        info.duration = duration;
                        info.playing = autoplay;
                        info.ended = false;
                        info.error = None;
                    }
                }
                Err(err) => {
                    warn!(%err, token, "could not decode track");
                    if let Ok(mut info) = playback_info.lock() {
                        info.token = Some(token);
                        info.position = Duration::ZERO;
                        info.duration = None;
                        info.playing = false;
                        info.ended = false;
                        info.error = Some(err.to_string());
                    }
                }
            }
        }

        AudioCmd::Release => {
            if let Some(old) = deck.take() {
                old.sink.stop();
            }
            if let Ok(mut info) = playback_info.lock() {
                *info = Default::default();
            }
        }

        AudioCmd::Play => {
            if let Some(d) = deck.as_mut() {
                if d.ended {
                    rebuild(stream, d, Duration::ZERO, *volume);
                }
                d.sink.play();
                d.paused = false;
            }
        }

        AudioCmd::Pause => {
            if let Some(d) = deck.as_mut() {
                d.sink.pause();
                d.paused = true;
            }
        }

        AudioCmd::SeekTo(pos) => {
            if let Some(d) = deck.as_mut() {
                let pos = d.duration.map_or(pos, |total| pos.min(total));
                rebuild(stream, d, pos, *volume);
            }
        }

        AudioCmd::SeekBy(secs) => {
            // Scrubbing: rebuild the current sink and skip into the stream.
            if let Some(d) = deck.as_mut() {
                let cur = d.position().as_secs() as i64;
                let new = Duration::from_secs((cur + secs as i64).max(0) as u64);
                let new = d.duration.map_or(new, |total| new.min(total));
                rebuild(stream, d, new, *volume);
            }
        }

        AudioCmd::Restart => {
            if let Some(d) = deck.as_mut() {
                rebuild(stream, d, Duration::ZERO, *volume);
                d.sink.play();
                d.paused = false;
            }
        }

        AudioCmd::SetVolume(v) => {
            *volume = v;
            if let Some(d) = deck.as_ref() {
                d.sink.set_volume(v);
            }
        }

        // Handled by the loop so it can break out.
        AudioCmd::Quit { .. } => {}
    }
}

/// Replace the deck's sink with a fresh one starting at `start_at`, keeping
/// the paused state.
fn rebuild(stream: &OutputStream, deck: &mut Deck, start_at: Duration, volume: f32) {
    deck.sink.stop();
    match create_sink_at(stream, deck.bytes.clone(), start_at) {
        Ok((sink, _)) => {
            sink.set_volume(volume);
            if !deck.paused {
                sink.play();
            }
            deck.sink = sink;
            deck.offset = start_at;
            deck.ended = false;
        }
        Err(err) => warn!(%err, token = deck.token, "could not rebuild sink"),
    }
}

/// Copy the deck's progress into the shared playback info.
fn publish(deck: &mut Option<Deck>, playback_info: &PlaybackHandle) {
    let Some(d) = deck.as_mut() else {
        return;
    };
    let just_ended = !d.ended && !d.paused && d.sink.empty();
    if just_ended {
        d.ended = true;
    }
    let Ok(mut info) = playback_info.lock() else {
        return;
    };
    if info.token != Some(d.token) {
        return;
    }
    info.position = match d.duration {
        Some(total) if d.ended => total,
        Some(total) => d.position().min(total),
        None => d.position(),
    };
    info.playing = !d.paused && !d.ended;
    if just_ended {
        info.ended = true;
    }
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
