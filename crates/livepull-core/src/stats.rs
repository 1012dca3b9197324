//! Periodic metrics snapshot delivered to the `StatsSink`.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerStats {
    pub video_queue_depth: usize,
    pub audio_queue_depth: usize,
    pub bitrate_kbps: f64,
    /// max(video_queue_depth * per-video-frame ms, audio_queue_depth * per-audio-frame ms)
    pub jitter_buffer_ms: f64,
    pub dropped_video_packets: u64,
}
