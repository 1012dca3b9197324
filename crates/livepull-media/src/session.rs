//! Shared state handed to the three per-connection stage threads — the
//! Context Mutex and the other fields the Player owns and the stages reach
//! into. Kept in one place so `demux_stage`/`video_stage`/`audio_stage` take
//! one bundle instead of a dozen positional `Arc`s.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

use livepull_core::{AudioStreamInfo, StatusSink, VideoStreamInfo};

use crate::owner::OwnerCmd;
use crate::queue::PacketQueue;
use crate::reconnect::ReconnectController;
use crate::traits::{AudioDecoder, InputStreamOpener, VideoDecoder};

/// The single Context Mutex: one lock guarding both decoder contexts for
/// the lifetime of a connection. Held only across a submit+receive call
/// pair, never across I/O or a queue wait.
#[derive(Default)]
pub struct DecoderContexts {
    pub video: Option<Box<dyn VideoDecoder>>,
    pub audio: Option<Box<dyn AudioDecoder>>,
}

/// Everything the demuxer thread needs for one session (spans every
/// reconnect attempt until `running` goes false).
pub struct DemuxContext {
    pub opener: Arc<dyn InputStreamOpener>,
    pub url: String,
    pub io_timeout_ms: u64,
    pub video_queue: Arc<PacketQueue>,
    pub audio_queue: Arc<PacketQueue>,
    pub decoder_ctx: Arc<Mutex<DecoderContexts>>,
    pub running: Arc<AtomicBool>,
    pub stop_requested: Arc<AtomicBool>,
    pub reconnect: Arc<ReconnectController>,
    pub bitrate_kbps: Arc<Mutex<f64>>,
    pub video_info: Arc<Mutex<Option<VideoStreamInfo>>>,
    pub audio_info: Arc<Mutex<Option<AudioStreamInfo>>>,
    pub status_sink: Arc<dyn StatusSink>,
    pub owner_tx: crossbeam_channel::Sender<OwnerCmd>,
}

pub struct VideoStageContext {
    pub video_queue: Arc<PacketQueue>,
    pub decoder_ctx: Arc<Mutex<DecoderContexts>>,
    pub running: Arc<AtomicBool>,
    pub frame_sink: Arc<dyn livepull_core::FrameSink>,
    pub status_sink: Arc<dyn StatusSink>,
}

pub struct AudioStageContext {
    pub audio_queue: Arc<PacketQueue>,
    pub decoder_ctx: Arc<Mutex<DecoderContexts>>,
    pub running: Arc<AtomicBool>,
    pub owner_tx: crossbeam_channel::Sender<OwnerCmd>,
    pub status_sink: Arc<dyn StatusSink>,
}

pub struct SessionThreads {
    pub demux: std::thread::JoinHandle<()>,
    pub video: std::thread::JoinHandle<()>,
    pub audio: std::thread::JoinHandle<()>,
}
