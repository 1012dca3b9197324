//! The owner thread: the one place an `AudioSink` is ever constructed,
//! called, or dropped. Hosts the stats timer and the audio-write timer.
//!
//! The audio output device is affine to whichever thread set it up, so
//! setup/teardown/write calls are all marshaled onto a dedicated timer
//! thread ticking every `audio_pump_interval_ms`, rather than invoked
//! ad hoc from whichever stage thread happens to have a buffer ready.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use livepull_core::{AudioSink, AudioStreamInfo, DecodedAudioBuffer, PlayerStats, StatsSink, VideoStreamInfo};

use crate::queue::PacketQueue;

pub enum OwnerCmd {
    NegotiateFormat {
        native_rate: u32,
        native_channels: u16,
        reply: Sender<anyhow::Result<(u32, u16)>>,
    },
    PushAudio(DecodedAudioBuffer),
    /// Tears down the current audio sink instance (no-audio-this-session
    /// boundary case, and the full-stop teardown step). The sink is rebuilt
    /// from the factory next time a format is negotiated.
    TeardownAudio {
        reply: Sender<()>,
    },
    Shutdown,
}

pub struct OwnerHandle {
    pub tx: Sender<OwnerCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl OwnerHandle {
    pub fn send(&self, cmd: OwnerCmd) {
        let _ = self.tx.send(cmd);
    }

    /// Stops the owner thread for good. Only called when the `Player` itself
    /// is dropped — not part of the per-session stop/start cycle.
    pub fn shutdown(&self) {
        let _ = self.tx.send(OwnerCmd::Shutdown);
        if let Some(h) = self.join.lock().take() {
            let _ = h.join();
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn spawn(
    audio_sink_factory: Box<dyn Fn() -> Box<dyn AudioSink> + Send>,
    video_queue: Arc<PacketQueue>,
    audio_queue: Arc<PacketQueue>,
    bitrate_kbps: Arc<Mutex<f64>>,
    video_info: Arc<Mutex<Option<VideoStreamInfo>>>,
    audio_info: Arc<Mutex<Option<AudioStreamInfo>>>,
    stats_sink: Arc<dyn StatsSink>,
    stats_interval_ms: u64,
    audio_pump_interval_ms: u64,
) -> OwnerHandle {
    let (tx, rx) = unbounded::<OwnerCmd>();

    let join = thread::Builder::new()
        .name("livepull-owner".into())
        .spawn(move || {
            run(
                rx,
                audio_sink_factory,
                video_queue,
                audio_queue,
                bitrate_kbps,
                video_info,
                audio_info,
                stats_sink,
                stats_interval_ms,
                audio_pump_interval_ms,
            )
        })
        .expect("failed to spawn owner thread");

    OwnerHandle { tx, join: Mutex::new(Some(join)) }
}

#[allow(clippy::too_many_arguments)]
fn run(
    rx: Receiver<OwnerCmd>,
    audio_sink_factory: Box<dyn Fn() -> Box<dyn AudioSink> + Send>,
    video_queue: Arc<PacketQueue>,
    audio_queue: Arc<PacketQueue>,
    bitrate_kbps: Arc<Mutex<f64>>,
    video_info: Arc<Mutex<Option<VideoStreamInfo>>>,
    audio_info: Arc<Mutex<Option<AudioStreamInfo>>>,
    stats_sink: Arc<dyn StatsSink>,
    stats_interval_ms: u64,
    audio_pump_interval_ms: u64,
) {
    let mut sink: Option<Box<dyn AudioSink>> = None;
    let mut pending: VecDeque<DecodedAudioBuffer> = VecDeque::new();
    let mut last_stats = Instant::now();
    let pump_interval = Duration::from_millis(audio_pump_interval_ms.max(1));
    let stats_interval = Duration::from_millis(stats_interval_ms.max(1));

    loop {
        match rx.recv_timeout(pump_interval) {
            Ok(OwnerCmd::NegotiateFormat { native_rate, native_channels, reply }) => {
                if sink.is_none() {
                    sink = Some(audio_sink_factory());
                }
                let result = sink
                    .as_mut()
                    .expect("just constructed")
                    .negotiate_format(native_rate, native_channels);
                let _ = reply.send(result);
            }
            Ok(OwnerCmd::PushAudio(buf)) => pending.push_back(buf),
            Ok(OwnerCmd::TeardownAudio { reply }) => {
                if let Some(mut s) = sink.take() {
                    s.teardown();
                }
                pending.clear();
                let _ = reply.send(());
            }
            Ok(OwnerCmd::Shutdown) => {
                if let Some(mut s) = sink.take() {
                    s.teardown();
                }
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }

        if let Some(s) = sink.as_mut() {
            pump(s.as_mut(), &mut pending);
        }

        if last_stats.elapsed() >= stats_interval {
            last_stats = Instant::now();
            let v_depth = video_queue.size();
            let a_depth = audio_queue.size();
            let video_ms = video_info.lock().as_ref().map(|v| v.frame_duration_ms()).unwrap_or(0.0);
            let audio_ms = audio_info.lock().as_ref().map(|a| a.frame_duration_secs * 1000.0).unwrap_or(0.0);
            let stats = PlayerStats {
                video_queue_depth: v_depth,
                audio_queue_depth: a_depth,
                bitrate_kbps: *bitrate_kbps.lock(),
                jitter_buffer_ms: (v_depth as f64 * video_ms).max(a_depth as f64 * audio_ms),
                dropped_video_packets: video_queue.dropped_count(),
            };
            stats_sink.on_stats(stats);
        }
    }
}

/// Drains `pending` into `sink`, writing as many bytes as it reports free.
/// A partially-written buffer's remainder is re-queued at the front so
/// ordering is preserved.
fn pump(sink: &mut dyn AudioSink, pending: &mut VecDeque<DecodedAudioBuffer>) {
    while let Some(mut buf) = pending.pop_front() {
        if buf.data.is_empty() {
            continue;
        }
        if sink.free_bytes() == 0 {
            pending.push_front(buf);
            break;
        }
        let written = sink.write(&buf.data);
        if written == 0 {
            pending.push_front(buf);
            break;
        }
        if written < buf.data.len() {
            buf.data.drain(0..written);
            pending.push_front(buf);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSink {
        free: usize,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl AudioSink for FakeSink {
        fn negotiate_format(&mut self, native_rate: u32, native_channels: u16) -> anyhow::Result<(u32, u16)> {
            Ok((native_rate, native_channels))
        }
        fn free_bytes(&self) -> usize {
            self.free
        }
        fn write(&mut self, data: &[u8]) -> usize {
            let n = data.len().min(self.free);
            self.written.lock().extend_from_slice(&data[..n]);
            n
        }
        fn teardown(&mut self) {}
    }

    #[test]
    fn pump_requeues_partial_write_remainder_at_front() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut sink = FakeSink { free: 3, written: written.clone() };
        let mut pending = VecDeque::new();
        pending.push_back(DecodedAudioBuffer { sample_rate: 48_000, channels: 2, data: vec![1, 2, 3, 4, 5] });

        pump(&mut sink, &mut pending);

        assert_eq!(*written.lock(), vec![1, 2, 3]);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].data, vec![4, 5]);
    }

    #[test]
    fn pump_drains_multiple_full_buffers() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut sink = FakeSink { free: 100, written: written.clone() };
        let mut pending = VecDeque::new();
        pending.push_back(DecodedAudioBuffer { sample_rate: 48_000, channels: 2, data: vec![1, 2] });
        pending.push_back(DecodedAudioBuffer { sample_rate: 48_000, channels: 2, data: vec![3, 4] });

        pump(&mut sink, &mut pending);

        assert_eq!(*written.lock(), vec![1, 2, 3, 4]);
        assert!(pending.is_empty());
    }

    #[test]
    fn pump_stops_when_sink_reports_no_free_bytes() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut sink = FakeSink { free: 0, written: written.clone() };
        let mut pending = VecDeque::new();
        pending.push_back(DecodedAudioBuffer { sample_rate: 48_000, channels: 2, data: vec![1, 2] });

        pump(&mut sink, &mut pending);

        assert!(written.lock().is_empty());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn owner_thread_negotiates_format_and_shuts_down() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let factory: Box<dyn Fn() -> Box<dyn AudioSink> + Send> = Box::new(move || {
            calls2.fetch_add(1, Ordering::Relaxed);
            Box::new(FakeSink { free: 10, written: Arc::new(Mutex::new(Vec::new())) })
        });

        let video_queue = Arc::new(PacketQueue::new(4, livepull_core::OverflowPolicy::DropOldest));
        let audio_queue = Arc::new(PacketQueue::new(4, livepull_core::OverflowPolicy::Block));
        let handle = spawn(
            factory,
            video_queue,
            audio_queue,
            Arc::new(Mutex::new(0.0)),
            Arc::new(Mutex::new(None)),
            Arc::new(Mutex::new(None)),
            Arc::new(livepull_core::sinks::NullSink),
            400,
            20,
        );

        let (tx, rx) = unbounded();
        handle.send(OwnerCmd::NegotiateFormat { native_rate: 48_000, native_channels: 2, reply: tx });
        let result = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(result.unwrap(), (48_000, 2));
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        handle.shutdown();
    }
}
