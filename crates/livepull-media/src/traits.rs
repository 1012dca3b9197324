//! The two abstraction seams over the codec/demux library: `InputStream`
//! (open, read-packet, stream metadata, interrupt hook) and `VideoDecoder`/
//! `AudioDecoder` (send-packet, receive-frame, color/format conversion).
//!
//! Everything else in this crate is written against these traits, not
//! against `ffmpeg_the_third` directly — `crate::ffmpeg_backend` is the only
//! module that names the codec library. That split is what lets the end-to-
//! end tests in `tests/` drive the whole pipeline with synthetic packets and
//! no real media file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use livepull_core::{
    AudioStreamInfo, DecodedAudioBuffer, DecodedVideoFrame, MediaKind, Packet, PlayerError,
    StreamDescriptor,
};

/// The cooperative cancellation signal an `InputStream` must honor inside
/// any blocking network call.
#[derive(Clone)]
pub struct InterruptHandle {
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new(running: Arc<AtomicBool>, stop_requested: Arc<AtomicBool>) -> Self {
        Self { running, stop_requested }
    }

    /// Returns `true` whenever the Player's `running` flag is false or
    /// `stop_requested` is true — the condition the FFmpeg interrupt
    /// callback polls for.
    pub fn should_interrupt(&self) -> bool {
        !self.running.load(Ordering::Relaxed) || self.stop_requested.load(Ordering::Relaxed)
    }
}

/// One connection's worth of demuxed input. Constructed fresh by an
/// `InputStreamOpener::open` call — never reused across reconnects.
pub trait InputStream: Send {
    fn descriptor(&self) -> &StreamDescriptor;

    /// Reads the next packet from the wire. `Ok(None)` means "packet
    /// belonged to a stream we don't route"; `Err` is a `TransientReadError`
    /// that ends the demux inner loop.
    fn read_packet(&mut self) -> Result<Option<(MediaKind, Packet)>, PlayerError>;

    /// Builds a video decoder bound to this connection's video stream.
    /// Decoder contexts are created in `open_stream`.
    fn open_video_decoder(&self) -> Result<Box<dyn VideoDecoder>, PlayerError>;

    /// Builds an audio decoder that resamples into `(out_rate, out_channels)`
    /// — the format negotiated with the `AudioSink` at `open_stream` time.
    fn open_audio_decoder(
        &self,
        info: &AudioStreamInfo,
        out_rate: u32,
        out_channels: u16,
    ) -> Result<Box<dyn AudioDecoder>, PlayerError>;
}

/// Opens a sanitized URL and returns a fresh `InputStream`. Implemented once
/// per backend (real FFmpeg, or a test double) and shared across every
/// reconnect attempt the `Player` makes.
pub trait InputStreamOpener: Send + Sync {
    fn open(
        &self,
        url: &str,
        io_timeout_ms: u64,
        interrupt: InterruptHandle,
    ) -> Result<Box<dyn InputStream>, PlayerError>;
}

/// Decodes one video stream's packets into RGB frames.
pub trait VideoDecoder: Send {
    /// Submits one packet and returns the *first* frame it produced, if any.
    /// Any additional frames FFmpeg buffered internally surface on a later
    /// call — the video stage publishes at most one frame per popped packet.
    fn decode(&mut self, packet: &Packet) -> Result<Option<DecodedVideoFrame>, PlayerError>;
}

/// Decodes one audio stream's packets into PCM buffers at the negotiated
/// output format.
pub trait AudioDecoder: Send {
    /// Submits one packet and returns every frame it produced, already
    /// resampled/repacked into the negotiated 16-bit interleaved format.
    fn decode(&mut self, packet: &Packet) -> Result<Vec<DecodedAudioBuffer>, PlayerError>;
}
