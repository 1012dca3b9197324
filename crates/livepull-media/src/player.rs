//! The single entry point. Owns the two queues, the Context
//! Mutex, the reconnect controller, the owner thread, and the three
//! per-session worker threads.
//!
//! `stop()` linearizes through one mutex-guarded `Idle`/`InProgress` state
//! transition rather than a quick-exit check plus a separate
//! `stop_in_progress` flag, so two overlapping callers can't both slip past
//! the check before either sees the other's write (see DESIGN.md).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};

use livepull_core::{
    AudioSink, FrameSink, PlayerConfig, PlayerError, StatsSink, StatusSink,
};

use crate::audio_stage;
use crate::demux_stage;
use crate::owner::{self, OwnerCmd, OwnerHandle};
use crate::queue::PacketQueue;
use crate::reconnect::ReconnectController;
use crate::session::{AudioStageContext, DecoderContexts, DemuxContext, SessionThreads, VideoStageContext};
use crate::traits::InputStreamOpener;

#[derive(PartialEq, Eq, Clone, Copy)]
enum ShutdownState {
    Idle,
    InProgress,
}

struct Shutdown {
    state: Mutex<ShutdownState>,
    cvar: Condvar,
}

pub struct Player {
    io_timeout_ms: u64,
    opener: Arc<dyn InputStreamOpener>,
    frame_sink: Arc<dyn FrameSink>,
    status_sink: Arc<dyn StatusSink>,

    video_queue: Arc<PacketQueue>,
    audio_queue: Arc<PacketQueue>,
    decoder_ctx: Arc<Mutex<DecoderContexts>>,
    video_info: Arc<Mutex<Option<livepull_core::VideoStreamInfo>>>,
    audio_info: Arc<Mutex<Option<livepull_core::AudioStreamInfo>>>,
    bitrate_kbps: Arc<Mutex<f64>>,

    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    reconnect: Arc<ReconnectController>,

    shutdown: Arc<Shutdown>,
    session_threads: Mutex<Option<SessionThreads>>,

    owner: OwnerHandle,
}

impl Player {
    pub fn new(
        config: PlayerConfig,
        opener: Arc<dyn InputStreamOpener>,
        audio_sink_factory: Box<dyn Fn() -> Box<dyn AudioSink> + Send>,
        frame_sink: Arc<dyn FrameSink>,
        status_sink: Arc<dyn StatusSink>,
        stats_sink: Arc<dyn StatsSink>,
    ) -> Self {
        let video_queue = Arc::new(PacketQueue::new(config.video_queue_capacity, config.video_queue_policy));
        let audio_queue = Arc::new(PacketQueue::new(config.audio_queue_capacity, config.audio_queue_policy));
        let bitrate_kbps = Arc::new(Mutex::new(0.0));
        let video_info = Arc::new(Mutex::new(None));
        let audio_info = Arc::new(Mutex::new(None));

        let owner = owner::spawn(
            audio_sink_factory,
            video_queue.clone(),
            audio_queue.clone(),
            bitrate_kbps.clone(),
            video_info.clone(),
            audio_info.clone(),
            stats_sink,
            config.stats_interval_ms,
            config.audio_pump_interval_ms,
        );

        Self {
            io_timeout_ms: config.io_timeout_ms,
            opener,
            frame_sink,
            status_sink,
            video_queue,
            audio_queue,
            decoder_ctx: Arc::new(Mutex::new(DecoderContexts::default())),
            video_info,
            audio_info,
            bitrate_kbps,
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            reconnect: Arc::new(ReconnectController::new(
                config.max_reconnect_attempts,
                config.reconnect_delay_ms,
            )),
            shutdown: Arc::new(Shutdown { state: Mutex::new(ShutdownState::Idle), cvar: Condvar::new() }),
            session_threads: Mutex::new(None),
            owner,
        }
    }

    /// Rejects an empty URL; otherwise stops any running session and waits
    /// for it to finish, then spawns a fresh demux/video/audio trio.
    pub fn start(&self, url: &str) -> Result<(), PlayerError> {
        if url.trim().is_empty() {
            return Err(PlayerError::Config("url must not be empty".into()));
        }

        self.trigger_stop();
        self.wait_stopped();

        self.video_queue.clear();
        self.video_queue.open();
        self.audio_queue.clear();
        self.audio_queue.open();
        self.video_queue.reset_dropped_count();
        self.reconnect.reset();
        *self.bitrate_kbps.lock() = 0.0;

        self.running.store(true, Ordering::Release);
        self.stop_requested.store(false, Ordering::Release);
        self.status_sink.on_status("Connecting");

        let demux_ctx = DemuxContext {
            opener: self.opener.clone(),
            url: crate::helpers::url::sanitize_url(url),
            io_timeout_ms: self.io_timeout_ms,
            video_queue: self.video_queue.clone(),
            audio_queue: self.audio_queue.clone(),
            decoder_ctx: self.decoder_ctx.clone(),
            running: self.running.clone(),
            stop_requested: self.stop_requested.clone(),
            reconnect: self.reconnect.clone(),
            bitrate_kbps: self.bitrate_kbps.clone(),
            video_info: self.video_info.clone(),
            audio_info: self.audio_info.clone(),
            status_sink: self.status_sink.clone(),
            owner_tx: self.owner.tx.clone(),
        };
        let video_ctx = VideoStageContext {
            video_queue: self.video_queue.clone(),
            decoder_ctx: self.decoder_ctx.clone(),
            running: self.running.clone(),
            frame_sink: self.frame_sink.clone(),
            status_sink: self.status_sink.clone(),
        };
        let audio_ctx = AudioStageContext {
            audio_queue: self.audio_queue.clone(),
            decoder_ctx: self.decoder_ctx.clone(),
            running: self.running.clone(),
            owner_tx: self.owner.tx.clone(),
            status_sink: self.status_sink.clone(),
        };

        let demux = thread::Builder::new()
            .name("livepull-demux".into())
            .spawn(move || demux_stage::run(demux_ctx))
            .expect("failed to spawn demux thread");
        let video = thread::Builder::new()
            .name("livepull-video".into())
            .spawn(move || crate::video_stage::run(video_ctx))
            .expect("failed to spawn video thread");
        let audio = thread::Builder::new()
            .name("livepull-audio".into())
            .spawn(move || crate::audio_stage::run(audio_ctx))
            .expect("failed to spawn audio thread");

        *self.session_threads.lock() = Some(SessionThreads { demux, video, audio });
        Ok(())
    }

    /// Idempotent and non-blocking: the actual teardown runs on a detached
    /// finalizer thread so a caller on e.g. a UI thread never blocks on
    /// joining the workers.
    pub fn stop(&self) {
        self.trigger_stop();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_max_reconnect_attempts(&self, n: i64) {
        self.reconnect.set_max_attempts(n.max(0) as u32);
    }

    pub fn set_reconnect_delay_ms(&self, ms: i64) {
        self.reconnect.set_delay_ms(ms.max(0) as u64);
    }

    /// Single mutex-guarded Idle -> InProgress transition (the fix for the
    /// recorded "stop idempotence racing" Open Question): a second caller
    /// observing `InProgress` simply returns without spawning anything.
    fn trigger_stop(&self) {
        let mut state = self.shutdown.state.lock();
        if *state == ShutdownState::InProgress {
            return;
        }
        if !self.running.load(Ordering::Relaxed) {
            return;
        }
        *state = ShutdownState::InProgress;
        drop(state);

        let running = self.running.clone();
        let stop_requested = self.stop_requested.clone();
        let video_queue = self.video_queue.clone();
        let audio_queue = self.audio_queue.clone();
        let decoder_ctx = self.decoder_ctx.clone();
        let bitrate_kbps = self.bitrate_kbps.clone();
        let status_sink = self.status_sink.clone();
        let owner_tx = self.owner.tx.clone();
        let session_threads = {
            // Safe to move the Mutex's guarded Option out here: no new
            // session can start until `wait_stopped` returns (start() always
            // waits on this same shutdown state before spawning threads).
            self.session_threads.lock().take()
        };
        let shutdown = self.shutdown.clone();

        thread::Builder::new()
            .name("livepull-shutdown".into())
            .spawn(move || {
                running.store(false, Ordering::Release);
                stop_requested.store(true, Ordering::Release);
                video_queue.close();
                audio_queue.close();

                if let Some(threads) = session_threads {
                    let _ = threads.demux.join();
                    let _ = threads.video.join();
                    let _ = threads.audio.join();
                }

                video_queue.clear();
                audio_queue.clear();
                *decoder_ctx.lock() = DecoderContexts::default();

                let (tx, rx) = std::sync::mpsc::channel();
                if owner_tx.send(OwnerCmd::TeardownAudio { reply: tx }).is_ok() {
                    let _ = rx.recv_timeout(std::time::Duration::from_secs(5));
                }

                *bitrate_kbps.lock() = 0.0;
                stop_requested.store(false, Ordering::Release);
                status_sink.on_status("Stopped");

                *shutdown.state.lock() = ShutdownState::Idle;
                shutdown.cvar.notify_all();
            })
            .expect("failed to spawn shutdown thread");
    }

    fn wait_stopped(&self) {
        let mut state = self.shutdown.state.lock();
        while *state == ShutdownState::InProgress {
            self.shutdown.cvar.wait(&mut state);
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.trigger_stop();
        self.wait_stopped();
        self.owner.shutdown();
    }
}
