//! Plain data types, error kinds, and sink traits shared between
//! `livepull-media` (the pipeline engine) and anything that drives a
//! [`Player`](../livepull_media/player/struct.Player.html).
//!
//! No ffmpeg, no threads — just types.

pub mod config;
pub mod error;
pub mod frame;
pub mod packet;
pub mod sinks;
pub mod stats;
pub mod stream;

pub use config::{OverflowPolicy, PlayerConfig};
pub use error::PlayerError;
pub use frame::{DecodedAudioBuffer, DecodedVideoFrame};
pub use packet::{MediaKind, Packet};
pub use sinks::{AudioSink, FrameSink, StatsSink, StatusSink};
pub use stats::PlayerStats;
pub use stream::{AudioStreamInfo, StreamDescriptor, VideoStreamInfo};
