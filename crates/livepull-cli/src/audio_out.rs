//! `cpal`-backed `AudioSink`. Constructed on the owner thread only (`cpal`
//! streams are not `Send` on most platforms and must stay alive for the
//! output device's entire lifetime); writes land in a small ring buffer the
//! stream's audio callback drains on its own schedule.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat as CpalSampleFormat, StreamConfig};
use livepull_core::AudioSink;

/// Bytes buffered beyond this are simply not accepted by `write` — the
/// caller (the owner thread's audio-write pump) re-queues the remainder.
const RING_CAPACITY_BYTES: usize = 1 << 20;

pub struct CpalAudioSink {
    stream: Option<cpal::Stream>,
    ring: Arc<Mutex<VecDeque<i16>>>,
    channels: u16,
}

impl CpalAudioSink {
    pub fn new() -> Self {
        Self { stream: None, ring: Arc::new(Mutex::new(VecDeque::new())), channels: 2 }
    }
}

impl Default for CpalAudioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for CpalAudioSink {
    fn negotiate_format(&mut self, native_rate: u32, native_channels: u16) -> anyhow::Result<(u32, u16)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no default audio output device"))?;

        let supported = device.supported_output_configs()?;
        let chosen = supported
            .filter(|c| c.sample_format() == CpalSampleFormat::I16)
            .find(|c| {
                c.channels() == native_channels
                    && (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&native_rate)
            })
            .or_else(|| {
                device
                    .supported_output_configs()
                    .ok()
                    .and_then(|mut it| it.find(|c| c.sample_format() == CpalSampleFormat::I16))
            })
            .ok_or_else(|| anyhow::anyhow!("no i16 output config available"))?;

        let rate = native_rate.clamp(chosen.min_sample_rate().0, chosen.max_sample_rate().0);
        let config: StreamConfig = chosen.with_sample_rate(cpal::SampleRate(rate)).config();
        let channels = config.channels;
        self.channels = channels;

        let ring = self.ring.clone();
        let stream = device.build_output_stream(
            &config,
            move |out: &mut [i16], _| {
                let mut buf = ring.lock().expect("audio ring poisoned");
                for slot in out.iter_mut() {
                    *slot = buf.pop_front().unwrap_or(0);
                }
            },
            |err| tracing::error!(target: "livepull_cli::audio", %err, "cpal stream error"),
            None,
        )?;
        stream.play()?;
        self.stream = Some(stream);

        Ok((rate, channels))
    }

    fn free_bytes(&self) -> usize {
        let used = self.ring.lock().expect("audio ring poisoned").len() * 2;
        RING_CAPACITY_BYTES.saturating_sub(used)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let free = self.free_bytes();
        let accept_bytes = data.len().min(free) & !1; // whole i16 samples only
        if accept_bytes == 0 {
            return 0;
        }
        let mut buf = self.ring.lock().expect("audio ring poisoned");
        for chunk in data[..accept_bytes].chunks_exact(2) {
            buf.push_back(i16::from_le_bytes([chunk[0], chunk[1]]));
        }
        accept_bytes
    }

    fn teardown(&mut self) {
        self.stream = None;
        self.ring.lock().expect("audio ring poisoned").clear();
    }
}
