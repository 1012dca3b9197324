//! The demuxer thread: drives the `InputStream`, routes packets, computes a
//! continuously running sliding-window bitrate, and owns the reconnect loop
//! (see [`crate::reconnect`]).

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;

use livepull_core::MediaKind;

use crate::owner::OwnerCmd;
use crate::session::DemuxContext;
use crate::traits::InterruptHandle;

pub fn run(ctx: DemuxContext) {
    loop {
        if !ctx.running.load(Ordering::Relaxed) {
            return;
        }

        let interrupt = InterruptHandle::new(ctx.running.clone(), ctx.stop_requested.clone());
        let mut input = match ctx.opener.open(&ctx.url, ctx.io_timeout_ms, interrupt) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(target: "livepull_media::demux", error = %e, "open failed");
                ctx.status_sink.on_error(&e.to_string());
                if !handle_retry(&ctx) {
                    return;
                }
                continue;
            }
        };

        ctx.reconnect.reset();

        let descriptor = input.descriptor().clone();
        *ctx.video_info.lock() = Some(descriptor.video.clone());

        match input.open_video_decoder() {
            Ok(vdec) => ctx.decoder_ctx.lock().video = Some(vdec),
            Err(e) => {
                ctx.status_sink.on_error(&format!("codec setup error: {e}"));
                *ctx.audio_info.lock() = None;
                if !handle_retry(&ctx) {
                    return;
                }
                continue;
            }
        }

        match &descriptor.audio {
            Some(audio_info) => {
                *ctx.audio_info.lock() = Some(audio_info.clone());
                match negotiate_and_open_audio(&ctx, input.as_ref(), audio_info) {
                    Ok(adec) => ctx.decoder_ctx.lock().audio = Some(adec),
                    Err(e) => {
                        // Open question decision (DESIGN.md): on any
                        // AudioSetupError, tear down all audio resources and
                        // continue video-only.
                        ctx.status_sink.on_error(&format!("audio setup error: {e}"));
                        teardown_audio(&ctx);
                        ctx.decoder_ctx.lock().audio = None;
                        *ctx.audio_info.lock() = None;
                    }
                }
            }
            None => {
                teardown_audio(&ctx);
                ctx.decoder_ctx.lock().audio = None;
                *ctx.audio_info.lock() = None;
            }
        }

        tracing::info!(target: "livepull_media::demux", url = %ctx.url, "connected");
        ctx.status_sink.on_status("Playing");
        *ctx.bitrate_kbps.lock() = 0.0;
        let mut window_bytes: u64 = 0;
        let mut window_start = Instant::now();

        loop {
            if !ctx.running.load(Ordering::Relaxed) {
                return;
            }
            match input.read_packet() {
                Ok(Some((kind, packet))) => {
                    window_bytes += packet.size() as u64;
                    let queue = match kind {
                        MediaKind::Video => &ctx.video_queue,
                        MediaKind::Audio => &ctx.audio_queue,
                    };
                    // Push failure while still running just means the queue
                    // closed under us mid-teardown; drop the packet and
                    // carry on rather than tight-spinning.
                    queue.push(packet, &ctx.running);
                }
                Ok(None) => {
                    // Packet belonged to a stream we don't route; dropped
                    // without counting.
                }
                Err(e) => {
                    tracing::warn!(target: "livepull_media::demux", error = %e, "connection lost");
                    ctx.status_sink.on_status("Connection lost");
                    ctx.status_sink.on_error(&e.to_string());
                    break;
                }
            }

            if window_start.elapsed() >= Duration::from_secs(1) {
                let secs = window_start.elapsed().as_secs_f64().max(0.001);
                *ctx.bitrate_kbps.lock() = (window_bytes as f64 * 8.0 / 1000.0) / secs;
                window_bytes = 0;
                window_start = Instant::now();
            }
        }

        ctx.video_queue.close();
        ctx.audio_queue.close();
        ctx.video_queue.clear();
        ctx.audio_queue.clear();
        drop(input);
        *ctx.decoder_ctx.lock() = Default::default();
        ctx.video_queue.open();
        ctx.audio_queue.open();

        if !handle_retry(&ctx) {
            return;
        }
    }
}

fn negotiate_and_open_audio(
    ctx: &DemuxContext,
    input: &dyn crate::traits::InputStream,
    audio_info: &livepull_core::AudioStreamInfo,
) -> anyhow::Result<Box<dyn crate::traits::AudioDecoder>> {
    let (tx, rx) = unbounded();
    ctx.owner_tx
        .send(OwnerCmd::NegotiateFormat {
            native_rate: audio_info.sample_rate,
            native_channels: audio_info.channels,
            reply: tx,
        })
        .map_err(|_| anyhow::anyhow!("owner thread unavailable"))?;
    let (out_rate, out_channels) = rx
        .recv_timeout(Duration::from_secs(5))
        .map_err(|_| anyhow::anyhow!("owner thread did not reply"))??;
    Ok(input.open_audio_decoder(audio_info, out_rate, out_channels)?)
}

fn teardown_audio(ctx: &DemuxContext) {
    let (tx, rx) = unbounded();
    if ctx.owner_tx.send(OwnerCmd::TeardownAudio { reply: tx }).is_ok() {
        let _ = rx.recv_timeout(Duration::from_secs(5));
    }
}

/// Increments the reconnect counter and either sleeps and returns `true`
/// (try again) or emits the terminal error/"Stopped" pair, clears `running`,
/// and returns `false`.
fn handle_retry(ctx: &DemuxContext) -> bool {
    if !ctx.running.load(Ordering::Relaxed) {
        return false;
    }
    let count = ctx.reconnect.record_failure();
    let max = ctx.reconnect.max_attempts();
    if count > max {
        tracing::error!(target: "livepull_media::demux", attempts = count, "reconnect budget exhausted");
        ctx.status_sink
            .on_error(&format!("reconnect budget exhausted after {count} attempt(s)"));
        ctx.status_sink.on_status("Stopped");
        ctx.running.store(false, Ordering::Release);
        return false;
    }
    tracing::info!(target: "livepull_media::demux", attempt = count, max, "retrying connection");
    ctx.status_sink.on_status(&format!("Retrying connection ({count}/{max})"));
    ctx.reconnect.sleep_interruptible(&ctx.running, &ctx.stop_requested);
    true
}
