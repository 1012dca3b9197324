//! Player configuration — serializable with `#[serde(default = "...")]`
//! fields so a config file missing newer fields still deserializes cleanly.

use serde::{Deserialize, Serialize};

/// The overflow rule applied when an enqueue would exceed a queue's
/// capacity — wait (`Block`) or discard the oldest entry (`DropOldest`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    Block,
    DropOldest,
}

fn default_video_queue_capacity() -> usize { 90 }
fn default_audio_queue_capacity() -> usize { 180 }
fn default_video_policy() -> OverflowPolicy { OverflowPolicy::DropOldest }
fn default_audio_policy() -> OverflowPolicy { OverflowPolicy::Block }
fn default_io_timeout_ms() -> u64 { 5_000 }
fn default_max_reconnect_attempts() -> u32 { 5 }
fn default_reconnect_delay_ms() -> u64 { 2_000 }
fn default_stats_interval_ms() -> u64 { 400 }
fn default_audio_pump_interval_ms() -> u64 { 20 }

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_video_queue_capacity")]
    pub video_queue_capacity: usize,
    #[serde(default = "default_audio_queue_capacity")]
    pub audio_queue_capacity: usize,
    #[serde(default = "default_video_policy")]
    pub video_queue_policy: OverflowPolicy,
    #[serde(default = "default_audio_policy")]
    pub audio_queue_policy: OverflowPolicy,
    /// Demux read/write timeout, in milliseconds (default 5 s).
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    /// 0 means "no retries". Runtime-mutable via `Player::set_max_reconnect_attempts`.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Runtime-mutable via `Player::set_reconnect_delay_ms`.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
    #[serde(default = "default_audio_pump_interval_ms")]
    pub audio_pump_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            video_queue_capacity: default_video_queue_capacity(),
            audio_queue_capacity: default_audio_queue_capacity(),
            video_queue_policy: default_video_policy(),
            audio_queue_policy: default_audio_policy(),
            io_timeout_ms: default_io_timeout_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            stats_interval_ms: default_stats_interval_ms(),
            audio_pump_interval_ms: default_audio_pump_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let c = PlayerConfig::default();
        assert_eq!(c.video_queue_capacity, 90);
        assert_eq!(c.audio_queue_capacity, 180);
        assert_eq!(c.video_queue_policy, OverflowPolicy::DropOldest);
        assert_eq!(c.audio_queue_policy, OverflowPolicy::Block);
        assert_eq!(c.io_timeout_ms, 5_000);
        assert_eq!(c.max_reconnect_attempts, 5);
        assert_eq!(c.reconnect_delay_ms, 2_000);
        assert_eq!(c.stats_interval_ms, 400);
        assert_eq!(c.audio_pump_interval_ms, 20);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let c: PlayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c.video_queue_capacity, 90);
        assert_eq!(c.reconnect_delay_ms, 2_000);
    }
}
