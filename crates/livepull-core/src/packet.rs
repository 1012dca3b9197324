//! The opaque compressed unit that flows from the demuxer to a decoder
//! stage through a `PacketQueue`.
//!
//! FFmpeg's own `AVPacket` carries native refcounting; here the bytes are
//! copied out of the decoder library's packet once per read, so an
//! `Arc<[u8]>` is the idiomatic equivalent of "one owner, shared by value,
//! released when the last reference drops".

use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

#[derive(Clone, Debug)]
pub struct Packet {
    pub data: Arc<[u8]>,
    pub kind: MediaKind,
    /// Presentation timestamp in the source stream's time base, if known.
    pub pts: Option<i64>,
}

impl Packet {
    pub fn new(data: Vec<u8>, kind: MediaKind, pts: Option<i64>) -> Self {
        Self { data: Arc::from(data), kind, pts }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}
