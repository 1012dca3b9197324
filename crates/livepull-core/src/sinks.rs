//! The three outbound sinks and the one inbound sink the core talks to.
//! The GUI, the audio device, and the codec/demux library all sit behind
//! these traits so `livepull-media` never has a direct dependency on a
//! widget toolkit or a sound card.

use crate::frame::DecodedVideoFrame;
use crate::stats::PlayerStats;

/// Receives decoded video frames. Delivered asynchronously; the sink must
/// tolerate bursts and must never block the core on rendering.
pub trait FrameSink: Send + 'static {
    fn on_frame(&self, frame: DecodedVideoFrame);
}

/// Receives textual state transitions. Values are one of a fixed set
/// ("Connecting", "Playing", "Connection lost", ...) plus
/// implementation-specific error prefixes.
pub trait StatusSink: Send + 'static {
    fn on_status(&self, text: &str);
    fn on_error(&self, message: &str);
}

/// Receives periodic `PlayerStats` snapshots, ~2.5 Hz plus on major
/// transitions.
pub trait StatsSink: Send + 'static {
    fn on_stats(&self, stats: PlayerStats);
}

/// The audio output device abstraction. Accepts interleaved
/// 16-bit PCM at a negotiated sample rate and channel count.
///
/// Setup/teardown must be affine to a single "owner" thread —
/// the core never calls these from a worker thread. Implementations commonly
/// wrap a real device handle (e.g. a `cpal::Stream`) that is not `Send`.
pub trait AudioSink {
    /// Ask the device for the nearest supported (rate, channels) to the
    /// source's native format. Called once per `open_stream`.
    fn negotiate_format(&mut self, native_rate: u32, native_channels: u16) -> anyhow::Result<(u32, u16)>;

    /// How many bytes of buffer space are currently free to accept.
    fn free_bytes(&self) -> usize;

    /// Write up to `free_bytes()` of `data`; returns the number of bytes
    /// actually accepted. The caller re-queues any remainder at the front
    /// of its pending-audio FIFO.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Tear down the device. Called on the owner thread during `stop()`.
    fn teardown(&mut self);
}

/// A `FrameSink`/`StatusSink`/`StatsSink` that discards everything. Useful
/// for tests and for a headless `Player` that only cares about reconnection
/// behavior.
pub struct NullSink;

impl FrameSink for NullSink {
    fn on_frame(&self, _frame: DecodedVideoFrame) {}
}

impl StatusSink for NullSink {
    fn on_status(&self, _text: &str) {}
    fn on_error(&self, _message: &str) {}
}

impl StatsSink for NullSink {
    fn on_stats(&self, _stats: PlayerStats) {}
}

/// Wraps a plain closure as a `FrameSink`.
pub struct FnFrameSink<F: Fn(DecodedVideoFrame) + Send + 'static>(pub F);

impl<F: Fn(DecodedVideoFrame) + Send + 'static> FrameSink for FnFrameSink<F> {
    fn on_frame(&self, frame: DecodedVideoFrame) {
        (self.0)(frame)
    }
}
