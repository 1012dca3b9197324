//! `FfmpegInputStream`/`FfmpegInputOpener` — the real `InputStream`
//! implementation: stream enumeration plus unsafe `AVCodecParameters`
//! pointer reads for fields the safe wrapper doesn't expose. The interrupt
//! callback and low-latency dictionary are wired the only way FFmpeg
//! exposes them: setting fields on the raw `AVFormatContext` before
//! `avformat_open_input` runs.

use std::ffi::CString;
use std::os::raw::{c_int, c_void};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::media::Type as MediaType;

use livepull_core::{
    AudioStreamInfo, MediaKind, Packet, PlayerError, SampleFormat, StreamDescriptor,
    VideoStreamInfo,
};

use crate::helpers::url::sanitize_url;
use crate::traits::{InputStream, InputStreamOpener, InterruptHandle, VideoDecoder, AudioDecoder};

use super::audio_decoder::FfmpegAudioDecoder;
use super::video_decoder::FfmpegVideoDecoder;
use super::{channel_id_to_string, low_latency_options};

/// Trampoline FFmpeg calls from inside a blocking network call. `opaque`
/// points at the `InterruptHandle` boxed in `FfmpegInputStream::interrupt`.
unsafe extern "C" fn interrupt_trampoline(opaque: *mut c_void) -> c_int {
    if opaque.is_null() {
        return 0;
    }
    let handle = &*(opaque as *const InterruptHandle);
    handle.should_interrupt() as c_int
}

pub struct FfmpegInputOpener;

impl InputStreamOpener for FfmpegInputOpener {
    fn open(
        &self,
        url: &str,
        io_timeout_ms: u64,
        interrupt: InterruptHandle,
    ) -> Result<Box<dyn InputStream>, PlayerError> {
        let url = sanitize_url(url);
        let options = low_latency_options(&url, io_timeout_ms);

        // The interrupt handle must outlive the AVFormatContext; boxing it
        // gives a heap-stable address regardless of where FfmpegInputStream
        // itself gets moved afterward.
        let interrupt_box = Box::into_raw(Box::new(interrupt));

        let ictx = unsafe {
            let mut ps = ffmpeg::ffi::avformat_alloc_context();
            if ps.is_null() {
                drop(Box::from_raw(interrupt_box));
                return Err(PlayerError::Open("avformat_alloc_context failed".into()));
            }
            (*ps).interrupt_callback = ffmpeg::ffi::AVIOInterruptCB {
                callback: Some(interrupt_trampoline),
                opaque: interrupt_box as *mut c_void,
            };

            let url_c = CString::new(url.clone())
                .map_err(|e| PlayerError::Open(format!("invalid url: {e}")))?;
            let mut dict_ptr = options.disown();

            let open_ret = ffmpeg::ffi::avformat_open_input(
                &mut ps,
                url_c.as_ptr(),
                std::ptr::null_mut(),
                &mut dict_ptr,
            );
            // Reclaim whatever options FFmpeg didn't consume so they're freed.
            let _ = ffmpeg::util::dictionary::Owned::own(dict_ptr);

            if open_ret < 0 {
                ffmpeg::ffi::avformat_free_context(ps);
                drop(Box::from_raw(interrupt_box));
                return Err(PlayerError::Open(format!(
                    "avformat_open_input failed (errno {open_ret})"
                )));
            }

            let info_ret = ffmpeg::ffi::avformat_find_stream_info(ps, std::ptr::null_mut());
            if info_ret < 0 {
                ffmpeg::ffi::avformat_close_input(&mut ps);
                drop(Box::from_raw(interrupt_box));
                return Err(PlayerError::Open(format!(
                    "avformat_find_stream_info failed (errno {info_ret})"
                )));
            }

            ffmpeg::format::context::Input::wrap(ps)
        };

        FfmpegInputStream::new(ictx, interrupt_box).map(|s| Box::new(s) as Box<dyn InputStream>)
    }
}

pub struct FfmpegInputStream {
    ictx: ffmpeg::format::context::Input,
    video_idx: usize,
    audio_idx: Option<usize>,
    descriptor: StreamDescriptor,
    interrupt: *mut InterruptHandle,
}

// SAFETY: `ictx` owns its AVFormatContext exclusively and every method here
// takes `&mut self`; the raw `interrupt` pointer is never dereferenced
// outside of `Drop` and the FFI trampoline, which only ever runs on FFmpeg's
// calling thread while this struct is alive.
unsafe impl Send for FfmpegInputStream {}

impl FfmpegInputStream {
    fn new(
        ictx: ffmpeg::format::context::Input,
        interrupt: *mut InterruptHandle,
    ) -> Result<Self, PlayerError> {
        let mut video_idx = None;
        let mut audio_idx = None;
        for stream in ictx.streams() {
            let medium = stream.parameters().medium();
            if medium == MediaType::Video && video_idx.is_none() {
                video_idx = Some(stream.index());
            } else if medium == MediaType::Audio && audio_idx.is_none() {
                audio_idx = Some(stream.index());
            }
        }

        let video_idx = video_idx.ok_or_else(|| {
            unsafe { drop(Box::from_raw(interrupt)) };
            PlayerError::Open("no video stream present".into())
        })?;

        let video = describe_video(&ictx, video_idx);
        let audio = audio_idx.map(|idx| describe_audio(&ictx, idx));

        Ok(Self {
            ictx,
            video_idx,
            audio_idx,
            descriptor: StreamDescriptor { video, audio },
            interrupt,
        })
    }
}

impl Drop for FfmpegInputStream {
    fn drop(&mut self) {
        unsafe { drop(Box::from_raw(self.interrupt)) };
    }
}

impl InputStream for FfmpegInputStream {
    fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    fn read_packet(&mut self) -> Result<Option<(MediaKind, Packet)>, PlayerError> {
        let mut iter = self.ictx.packets();
        match iter.next() {
            Some(Ok((stream, av_packet))) => {
                let idx = stream.index();
                let kind = if idx == self.video_idx {
                    MediaKind::Video
                } else if Some(idx) == self.audio_idx {
                    MediaKind::Audio
                } else {
                    // Tie-break: not one of our two selected
                    // streams, drop without counting.
                    return Ok(None);
                };
                let data = av_packet.data().unwrap_or(&[]).to_vec();
                let pts = av_packet.pts();
                Ok(Some((kind, Packet::new(data, kind, pts))))
            }
            Some(Err(e)) => Err(PlayerError::TransientRead(e.to_string())),
            None => Err(PlayerError::TransientRead("end of stream".into())),
        }
    }

    fn open_video_decoder(&self) -> Result<Box<dyn VideoDecoder>, PlayerError> {
        let stream = self
            .ictx
            .stream(self.video_idx)
            .ok_or_else(|| PlayerError::CodecSetup("video stream vanished".into()))?;
        Ok(Box::new(FfmpegVideoDecoder::open(stream.parameters())?))
    }

    fn open_audio_decoder(
        &self,
        info: &AudioStreamInfo,
        out_rate: u32,
        out_channels: u16,
    ) -> Result<Box<dyn AudioDecoder>, PlayerError> {
        let idx = self
            .audio_idx
            .ok_or_else(|| PlayerError::CodecSetup("no audio stream".into()))?;
        let stream = self
            .ictx
            .stream(idx)
            .ok_or_else(|| PlayerError::CodecSetup("audio stream vanished".into()))?;
        let _ = info;
        Ok(Box::new(FfmpegAudioDecoder::open(
            stream.parameters(),
            out_rate,
            out_channels,
        )?))
    }
}

fn describe_video(ictx: &ffmpeg::format::context::Input, idx: usize) -> VideoStreamInfo {
    let stream = ictx.stream(idx).expect("video_idx just enumerated");
    let params = stream.parameters();
    let codec_id = channel_id_to_string(params.id());

    // unsafe: width/height aren't exposed by the safe Parameters wrapper.
    let (width, height) = unsafe {
        let p = params.as_ptr();
        ((*p).width.max(0) as u32, (*p).height.max(0) as u32)
    };

    // Frame-rate fallback chain: avg -> real -> 1/time_base -> 30fps.
    let frame_rate = unsafe {
        let sp = stream.as_ptr();
        let avg = (*sp).avg_frame_rate;
        let real = (*sp).r_frame_rate;
        if avg.num > 0 && avg.den > 0 {
            (avg.num, avg.den)
        } else if real.num > 0 && real.den > 0 {
            (real.num, real.den)
        } else {
            let tb = stream.time_base();
            if tb.numerator() > 0 {
                (tb.denominator(), tb.numerator())
            } else {
                (30, 1)
            }
        }
    };

    VideoStreamInfo { stream_index: idx, codec_id, width, height, frame_rate }
}

fn describe_audio(ictx: &ffmpeg::format::context::Input, idx: usize) -> AudioStreamInfo {
    let stream = ictx.stream(idx).expect("audio_idx just enumerated");
    let params = stream.parameters();
    let codec_id = channel_id_to_string(params.id());

    let (sample_rate, channels, frame_size) = unsafe {
        let p = params.as_ptr();
        (
            (*p).sample_rate.max(0) as u32,
            (*p).ch_layout.nb_channels.max(0) as u16,
            (*p).frame_size.max(0) as u32,
        )
    };

    let frame_duration_secs = if sample_rate > 0 {
        if frame_size > 0 {
            frame_size as f64 / sample_rate as f64
        } else {
            1024.0 / sample_rate as f64
        }
    } else {
        1024.0 / 48_000.0
    };

    AudioStreamInfo {
        stream_index: idx,
        codec_id,
        sample_rate,
        channels,
        sample_format: SampleFormat::Other,
        frame_duration_secs,
    }
}
