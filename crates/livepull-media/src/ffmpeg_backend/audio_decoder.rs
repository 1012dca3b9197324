//! `FfmpegAudioDecoder`: opens a `software::resampling::Context` once per
//! connection and `run()`s it per decoded frame, the same open-once /
//! run-per-frame shape the video path uses for its scaler.

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::sample::{Sample, Type as SampleType};
use ffmpeg::software::resampling::context::Context as SwrContext;
use ffmpeg::util::channel_layout::ChannelLayout;

use livepull_core::{DecodedAudioBuffer, Packet, PlayerError};

use crate::traits::AudioDecoder;

pub struct FfmpegAudioDecoder {
    decoder: ffmpeg::decoder::Audio,
    resampler: SwrContext,
    out_rate: u32,
    out_channels: u16,
}

impl FfmpegAudioDecoder {
    pub fn open(
        params: ffmpeg::codec::Parameters,
        out_rate: u32,
        out_channels: u16,
    ) -> Result<Self, PlayerError> {
        let ctx = ffmpeg::codec::context::Context::from_parameters(params)
            .map_err(|e| PlayerError::CodecSetup(format!("audio decoder ctx: {e}")))?;
        let decoder = ctx
            .decoder()
            .audio()
            .map_err(|e| PlayerError::CodecSetup(format!("audio decoder open: {e}")))?;

        // Channel-layout fallback chain: decoder context ->
        // codec parameters -> default layout for N channels. The codec
        // parameters hop folds into the already-probed channel count (it
        // came from AVCodecParameters when the stream was described), so
        // only two links are materialized here — the third is implicit in
        // `out_channels`/the probed channel count already having used it.
        let in_layout = {
            let l = decoder.channel_layout();
            if l.channels() > 0 {
                l
            } else {
                ChannelLayout::default(decoder.channels() as i32)
            }
        };

        let out_layout = ChannelLayout::default(out_channels as i32);
        let resampler = SwrContext::get(
            decoder.format(),
            in_layout,
            decoder.rate(),
            Sample::I16(SampleType::Packed),
            out_layout,
            out_rate,
        )
        .map_err(|e| PlayerError::CodecSetup(format!("audio resampler: {e}")))?;

        Ok(Self { decoder, resampler, out_rate, out_channels })
    }
}

impl AudioDecoder for FfmpegAudioDecoder {
    fn decode(&mut self, packet: &Packet) -> Result<Vec<DecodedAudioBuffer>, PlayerError> {
        let av_packet = ffmpeg::codec::packet::Packet::copy(&packet.data);
        if self.decoder.send_packet(&av_packet).is_err() {
            return Ok(Vec::new());
        }

        let mut buffers = Vec::new();
        let mut decoded = ffmpeg::util::frame::audio::Audio::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            // Upper bound on produced samples for this frame at the negotiated rate.
            let max_out_samples = (decoded.samples() as u64 * self.out_rate as u64
                / decoded.rate().max(1) as u64
                + 1) as usize;

            let mut out_frame = ffmpeg::util::frame::audio::Audio::new(
                Sample::I16(SampleType::Packed),
                max_out_samples,
                ChannelLayout::default(self.out_channels as i32),
            );

            let produced = match self.resampler.run(&decoded, &mut out_frame) {
                Ok(_) => out_frame.samples(),
                Err(_) => continue, // DecodeError: skip this frame, keep draining
            };

            let byte_len = produced * self.out_channels as usize * 2;
            let raw = out_frame.data(0);
            let data = raw[..byte_len.min(raw.len())].to_vec();

            buffers.push(DecodedAudioBuffer {
                sample_rate: self.out_rate,
                channels: self.out_channels,
                data,
            });
        }

        Ok(buffers)
    }
}
