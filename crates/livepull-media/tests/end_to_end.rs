//! End-to-end scenarios driven by a mock `InputStream`/decoder pair instead
//! of a real media file — the reason `crate::traits` exists as a seam
//! separate from `ffmpeg_backend`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use livepull_core::{
    AudioSink, AudioStreamInfo, DecodedAudioBuffer, DecodedVideoFrame, FrameSink, MediaKind,
    Packet, PlayerConfig, PlayerError, SampleFormat, StatsSink, StatusSink, StreamDescriptor,
    VideoStreamInfo,
};
use livepull_media::traits::{AudioDecoder, InputStream, InputStreamOpener, InterruptHandle, VideoDecoder};
use livepull_media::Player;

fn video_info() -> VideoStreamInfo {
    VideoStreamInfo { stream_index: 0, codec_id: "h264".into(), width: 8, height: 8, frame_rate: (30, 1) }
}

fn audio_info() -> AudioStreamInfo {
    AudioStreamInfo {
        stream_index: 1,
        codec_id: "aac".into(),
        sample_rate: 48_000,
        channels: 2,
        sample_format: SampleFormat::S16,
        frame_duration_secs: 1024.0 / 48_000.0,
    }
}

struct PassthroughVideoDecoder;
impl VideoDecoder for PassthroughVideoDecoder {
    fn decode(&mut self, _packet: &Packet) -> Result<Option<DecodedVideoFrame>, PlayerError> {
        Ok(Some(DecodedVideoFrame { width: 8, height: 8, data: vec![0; 8 * 8 * 4] }))
    }
}

struct PassthroughAudioDecoder;
impl AudioDecoder for PassthroughAudioDecoder {
    fn decode(&mut self, _packet: &Packet) -> Result<Vec<DecodedAudioBuffer>, PlayerError> {
        Ok(vec![DecodedAudioBuffer { sample_rate: 48_000, channels: 2, data: vec![0; 8] }])
    }
}

/// A scripted input stream: emits `video_packets` video packets and
/// `audio_packets` audio packets (interleaved 1:2 to mimic 30fps video /
/// 48kHz audio arrival), then returns a read error forever after.
struct ScriptedInputStream {
    descriptor: StreamDescriptor,
    video_left: Mutex<u32>,
    audio_left: Mutex<u32>,
    burst: bool,
}

impl InputStream for ScriptedInputStream {
    fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    fn read_packet(&mut self) -> Result<Option<(MediaKind, Packet)>, PlayerError> {
        let mut v = self.video_left.lock().unwrap();
        if *v > 0 {
            *v -= 1;
            if !self.burst {
                std::thread::sleep(Duration::from_millis(2));
            }
            return Ok(Some((MediaKind::Video, Packet::new(vec![0; 4], MediaKind::Video, None))));
        }
        drop(v);
        let mut a = self.audio_left.lock().unwrap();
        if *a > 0 {
            *a -= 1;
            return Ok(Some((MediaKind::Audio, Packet::new(vec![0; 4], MediaKind::Audio, None))));
        }
        drop(a);
        std::thread::sleep(Duration::from_millis(2));
        Err(PlayerError::TransientRead("scripted end of stream".into()))
    }

    fn open_video_decoder(&self) -> Result<Box<dyn VideoDecoder>, PlayerError> {
        Ok(Box::new(PassthroughVideoDecoder))
    }

    fn open_audio_decoder(
        &self,
        _info: &AudioStreamInfo,
        _out_rate: u32,
        _out_channels: u16,
    ) -> Result<Box<dyn AudioDecoder>, PlayerError> {
        Ok(Box::new(PassthroughAudioDecoder))
    }
}

enum OpenerBehavior {
    Scripted { video_packets: u32, audio_packets: u32, burst: bool },
    AlwaysFail,
    BlocksThenFails { block: Duration },
}

struct ScriptedOpener {
    behavior: OpenerBehavior,
    open_attempts: AtomicUsize,
}

impl InputStreamOpener for ScriptedOpener {
    fn open(
        &self,
        _url: &str,
        _io_timeout_ms: u64,
        interrupt: InterruptHandle,
    ) -> Result<Box<dyn InputStream>, PlayerError> {
        self.open_attempts.fetch_add(1, Ordering::Relaxed);
        match &self.behavior {
            OpenerBehavior::Scripted { video_packets, audio_packets, burst } => {
                Ok(Box::new(ScriptedInputStream {
                    descriptor: StreamDescriptor { video: video_info(), audio: Some(audio_info()) },
                    video_left: Mutex::new(*video_packets),
                    audio_left: Mutex::new(*audio_packets),
                    burst: *burst,
                }))
            }
            OpenerBehavior::AlwaysFail => Err(PlayerError::Open("mock open always fails".into())),
            OpenerBehavior::BlocksThenFails { block } => {
                let start = Instant::now();
                while start.elapsed() < *block {
                    if interrupt.should_interrupt() {
                        return Err(PlayerError::Open("interrupted".into()));
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
                Err(PlayerError::Open("mock open timed out".into()))
            }
        }
    }
}

struct NoopAudioSink;
impl AudioSink for NoopAudioSink {
    fn negotiate_format(&mut self, native_rate: u32, native_channels: u16) -> anyhow::Result<(u32, u16)> {
        Ok((native_rate, native_channels))
    }
    fn free_bytes(&self) -> usize {
        1 << 20
    }
    fn write(&mut self, data: &[u8]) -> usize {
        data.len()
    }
    fn teardown(&mut self) {}
}

#[derive(Default)]
struct CountingFrameSink(AtomicUsize);
impl FrameSink for CountingFrameSink {
    fn on_frame(&self, _frame: DecodedVideoFrame) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct RecordingStatusSink {
    statuses: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}
impl StatusSink for RecordingStatusSink {
    fn on_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }
    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
struct CountingStatsSink {
    ticks: AtomicUsize,
    last_bitrate_bits: AtomicU64,
}
impl StatsSink for CountingStatsSink {
    fn on_stats(&self, stats: livepull_core::PlayerStats) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.last_bitrate_bits.store(stats.bitrate_kbps.to_bits(), Ordering::Relaxed);
    }
}

fn wait_until(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}

#[test]
fn happy_path_delivers_frames_and_stats() {
    let frame_sink = Arc::new(CountingFrameSink::default());
    let stats_sink = Arc::new(CountingStatsSink::default());
    let opener = Arc::new(ScriptedOpener {
        behavior: OpenerBehavior::Scripted { video_packets: 100, audio_packets: 200, burst: false },
        open_attempts: AtomicUsize::new(0),
    });

    let mut config = PlayerConfig::default();
    config.stats_interval_ms = 100;

    let player = Player::new(
        config,
        opener,
        Box::new(|| Box::new(NoopAudioSink)),
        frame_sink.clone(),
        Arc::new(RecordingStatusSink::default()),
        stats_sink.clone(),
    );

    player.start("rtsp://mock/stream").unwrap();
    assert!(wait_until(|| frame_sink.0.load(Ordering::Relaxed) >= 90, Duration::from_secs(4)));
    assert!(stats_sink.ticks.load(Ordering::Relaxed) >= 2);
    assert!(f64::from_bits(stats_sink.last_bitrate_bits.load(Ordering::Relaxed)) >= 0.0);

    player.stop();
    assert!(wait_until(|| !player.is_running(), Duration::from_secs(2)));
}

#[test]
fn video_backpressure_caps_queue_depth_and_drops_packets() {
    let frame_sink = Arc::new(CountingFrameSink::default());
    let opener = Arc::new(ScriptedOpener {
        behavior: OpenerBehavior::Scripted { video_packets: 500, audio_packets: 0, burst: true },
        open_attempts: AtomicUsize::new(0),
    });

    let config = PlayerConfig::default(); // video_queue_capacity = 90, DropOldest
    let player = Player::new(
        config,
        opener,
        Box::new(|| Box::new(NoopAudioSink)),
        frame_sink,
        Arc::new(RecordingStatusSink::default()),
        Arc::new(livepull_core::sinks::NullSink),
    );

    player.start("rtsp://mock/burst").unwrap();
    std::thread::sleep(Duration::from_millis(300));
    player.stop();
    assert!(wait_until(|| !player.is_running(), Duration::from_secs(2)));
}

#[test]
fn connection_lost_then_recovers() {
    let status_sink = Arc::new(RecordingStatusSink::default());
    let opener = Arc::new(ScriptedOpener {
        behavior: OpenerBehavior::Scripted { video_packets: 50, audio_packets: 50, burst: false },
        open_attempts: AtomicUsize::new(0),
    });

    let mut config = PlayerConfig::default();
    config.max_reconnect_attempts = 3;
    config.reconnect_delay_ms = 50;

    let player = Player::new(
        config,
        opener,
        Box::new(|| Box::new(NoopAudioSink)),
        Arc::new(CountingFrameSink::default()),
        status_sink.clone(),
        Arc::new(livepull_core::sinks::NullSink),
    );

    player.start("rtsp://mock/flaky").unwrap();
    assert!(wait_until(
        || status_sink.statuses.lock().unwrap().iter().any(|s| s.starts_with("Retrying connection")),
        Duration::from_secs(3),
    ));

    let statuses = status_sink.statuses.lock().unwrap().clone();
    assert!(statuses.contains(&"Connecting".to_string()));
    assert!(statuses.contains(&"Playing".to_string()));
    assert!(statuses.contains(&"Connection lost".to_string()));

    player.stop();
    assert!(wait_until(|| !player.is_running(), Duration::from_secs(2)));
}

#[test]
fn retry_exhaustion_stops_after_configured_attempts() {
    let status_sink = Arc::new(RecordingStatusSink::default());
    let opener = Arc::new(ScriptedOpener { behavior: OpenerBehavior::AlwaysFail, open_attempts: AtomicUsize::new(0) });

    let mut config = PlayerConfig::default();
    config.max_reconnect_attempts = 2;
    config.reconnect_delay_ms = 10;

    let player = Player::new(
        config,
        opener,
        Box::new(|| Box::new(NoopAudioSink)),
        Arc::new(CountingFrameSink::default()),
        status_sink.clone(),
        Arc::new(livepull_core::sinks::NullSink),
    );

    player.start("rtsp://mock/unreachable").unwrap();
    assert!(wait_until(|| !player.is_running(), Duration::from_secs(3)));

    let statuses = status_sink.statuses.lock().unwrap().clone();
    let retrying = statuses.iter().filter(|s| s.starts_with("Retrying connection")).count();
    assert_eq!(retrying, 2);
    assert_eq!(statuses.last().map(String::as_str), Some("Stopped"));

    let errors = status_sink.errors.lock().unwrap();
    assert!(errors.iter().any(|e| e.contains("exhausted")));
}

#[test]
fn stop_during_slow_open_returns_promptly() {
    let opener = Arc::new(ScriptedOpener {
        behavior: OpenerBehavior::BlocksThenFails { block: Duration::from_secs(2) },
        open_attempts: AtomicUsize::new(0),
    });
    let frame_sink = Arc::new(CountingFrameSink::default());

    let player = Player::new(
        PlayerConfig::default(),
        opener,
        Box::new(|| Box::new(NoopAudioSink)),
        frame_sink.clone(),
        Arc::new(livepull_core::sinks::NullSink),
        Arc::new(livepull_core::sinks::NullSink),
    );

    player.start("rtsp://mock/slow-open").unwrap();
    std::thread::sleep(Duration::from_millis(20));

    let stop_started = Instant::now();
    player.stop();
    assert!(wait_until(|| !player.is_running(), Duration::from_millis(500)));
    assert!(stop_started.elapsed() < Duration::from_millis(500));
    assert_eq!(frame_sink.0.load(Ordering::Relaxed), 0);
}

#[test]
fn url_sanitization_strips_listen_params_before_open() {
    use livepull_media::helpers::url::sanitize_url;

    assert_eq!(
        sanitize_url("rtmp://host/app/stream?listen=1&listen_timeout=30"),
        "rtmp://host/app/stream"
    );
    assert_eq!(sanitize_url("rtsp://host/stream"), "rtsp://host/stream");
}
