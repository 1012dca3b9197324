//! The only module in this crate that names `ffmpeg_the_third` directly —
//! everything upstream of here (queue, stages, reconnect, player) is written
//! against the `InputStream`/`VideoDecoder`/`AudioDecoder` traits in
//! `crate::traits`.
//!
//! Uses `format::input`, `ictx.streams().best(Type::Video)`, a second
//! `Input` context to build the decoder so `Parameters` doesn't keep the
//! first one borrowed, and unsafe raw-pointer reads of `AVCodecParameters`
//! fields the safe wrapper doesn't expose.

mod audio_decoder;
mod input_stream;
mod video_decoder;

pub use input_stream::FfmpegInputOpener;

use ffmpeg_the_third as ffmpeg;

/// Low-latency input options shared by every open attempt:
/// no input buffering, low-delay decoding, and a 5 s-class read/write
/// timeout carried in `io_timeout_ms`.
fn low_latency_options(url: &str, io_timeout_ms: u64) -> ffmpeg::util::dictionary::Owned<'static> {
    let mut dict = ffmpeg::util::dictionary::Owned::new();
    dict.set("fflags", "nobuffer");
    dict.set("flags", "low_delay");

    let timeout_us = (io_timeout_ms * 1_000).to_string();
    if url.starts_with("rtsp://") {
        // Forces RTSP onto TCP; `stimeout` is the
        // microsecond read timeout ffmpeg's RTSP demuxer expects.
        dict.set("rtsp_transport", "tcp");
        dict.set("stimeout", &timeout_us);
    } else {
        dict.set("timeout", &timeout_us);
    }
    dict
}

fn channel_id_to_string(id: ffmpeg::codec::Id) -> String {
    format!("{id:?}")
}
