//! Terminal `StatusSink`/`StatsSink`, and a `FrameSink` that only counts
//! frames (no widget toolkit in this crate — painting pixels is a GUI's
//! job). Logged with `tracing` rather than bare `eprintln!` so severity and
//! per-subsystem targets survive into a real deployment.

use std::sync::atomic::{AtomicU64, Ordering};

use livepull_core::{DecodedVideoFrame, FrameSink, PlayerStats, StatsSink, StatusSink};

pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn on_status(&self, text: &str) {
        tracing::info!(target: "livepull_cli::status", "{text}");
    }

    fn on_error(&self, message: &str) {
        tracing::warn!(target: "livepull_cli::status", "{message}");
    }
}

pub struct TracingStatsSink;

impl StatsSink for TracingStatsSink {
    fn on_stats(&self, stats: PlayerStats) {
        tracing::debug!(
            target: "livepull_cli::stats",
            video_queue = stats.video_queue_depth,
            audio_queue = stats.audio_queue_depth,
            bitrate_kbps = stats.bitrate_kbps,
            jitter_ms = stats.jitter_buffer_ms,
            dropped_video = stats.dropped_video_packets,
            "stats tick"
        );
    }
}

/// Counts delivered frames instead of painting them — a terminal demo has
/// nowhere to put pixels.
#[derive(Default)]
pub struct CountingFrameSink {
    count: AtomicU64,
}

impl CountingFrameSink {
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl FrameSink for CountingFrameSink {
    fn on_frame(&self, frame: DecodedVideoFrame) {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if n % 150 == 0 {
            tracing::debug!(target: "livepull_cli::frames", count = n, width = frame.width, height = frame.height, "frames delivered");
        }
    }
}
