//! `FfmpegVideoDecoder` — a `send_packet`/`receive_frame`/`SwsContext::run`
//! triplet, narrowed to publish at most one frame per submitted packet.

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};

use livepull_core::{DecodedVideoFrame, Packet, PlayerError};

use crate::traits::VideoDecoder;

pub struct FfmpegVideoDecoder {
    decoder: ffmpeg::decoder::Video,
    scaler: SwsContext,
    out_w: u32,
    out_h: u32,
}

impl FfmpegVideoDecoder {
    pub fn open(params: ffmpeg::codec::Parameters) -> Result<Self, PlayerError> {
        let ctx = ffmpeg::codec::context::Context::from_parameters(params)
            .map_err(|e| PlayerError::CodecSetup(format!("video decoder ctx: {e}")))?;
        let decoder = ctx
            .decoder()
            .video()
            .map_err(|e| PlayerError::CodecSetup(format!("video decoder open: {e}")))?;

        // Output sized to the source resolution.
        let out_w = decoder.width();
        let out_h = decoder.height();

        let scaler = SwsContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::BGRA,
            out_w,
            out_h,
            Flags::BILINEAR,
        )
        .map_err(|e| PlayerError::CodecSetup(format!("video scaler: {e}")))?;

        Ok(Self { decoder, scaler, out_w, out_h })
    }
}

impl VideoDecoder for FfmpegVideoDecoder {
    fn decode(&mut self, packet: &Packet) -> Result<Option<DecodedVideoFrame>, PlayerError> {
        let av_packet = ffmpeg::codec::packet::Packet::copy(&packet.data);
        if self.decoder.send_packet(&av_packet).is_err() {
            // Non-fatal decode error: skip this packet, stage keeps draining.
            return Ok(None);
        }

        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None); // needs more input before a frame is available
        }

        let mut out = ffmpeg::util::frame::video::Video::empty();
        if self.scaler.run(&decoded, &mut out).is_err() {
            return Ok(None);
        }

        let stride = out.stride(0);
        let raw = out.data(0);
        let row_bytes = self.out_w as usize * 4;
        let data: Vec<u8> = (0..self.out_h as usize)
            .flat_map(|row| {
                let start = row * stride;
                &raw[start..start + row_bytes]
            })
            .copied()
            .collect();

        Ok(Some(DecodedVideoFrame { width: self.out_w, height: self.out_h, data }))
    }
}
