//! Decoded output handed to the outbound sinks. Ownership transfers out of
//! the core by value once produced — downstream sinks exclusively own the
//! buffer thereafter.

/// Interleaved 32-bit color, 8 bits per channel, row stride = width * 4,
/// origin top-left.
#[derive(Clone, Debug)]
pub struct DecodedVideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl DecodedVideoFrame {
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

/// Signed 16-bit, little-endian, interleaved PCM at the negotiated rate and
/// channel count.
#[derive(Clone, Debug)]
pub struct DecodedAudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub data: Vec<u8>,
}

impl DecodedAudioBuffer {
    pub fn sample_count(&self) -> usize {
        let frame_bytes = self.channels as usize * 2;
        if frame_bytes == 0 { 0 } else { self.data.len() / frame_bytes }
    }
}
