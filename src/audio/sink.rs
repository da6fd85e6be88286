//! Utilities for creating `rodio` sinks from in-memory track bytes.
//!
//! The helper here encapsulates decoding a byte stream and preparing a
//! paused `Sink` at the requested start position.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, Sink, Source};

/// Create a paused `Sink` for `bytes` that starts playback at `start_at`.
///
/// Also returns the total duration reported by the decoder, if any.
pub(super) fn create_sink_at(
    handle: &OutputStream,
    bytes: Arc<[u8]>,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), DecoderError> {
    let decoder = Decoder::new(Cursor::new(bytes))?;
    let total = decoder.total_duration();
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(handle.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
