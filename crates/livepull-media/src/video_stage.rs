//! The video decoder thread: a continuously running submit/receive/scale
//! loop reading off a [`crate::queue::PacketQueue`].

use crate::session::VideoStageContext;

pub fn run(ctx: VideoStageContext) {
    tracing::debug!(target: "livepull_media::video", "video stage started");
    loop {
        let Some(packet) = ctx.video_queue.pop(&ctx.running) else {
            tracing::debug!(target: "livepull_media::video", "video stage exiting");
            return;
        };

        let mut guard = ctx.decoder_ctx.lock();
        let Some(decoder) = guard.video.as_mut() else {
            // Between reconnects the decoder context is briefly absent.
            continue;
        };

        let result = decoder.decode(&packet);
        drop(guard);

        match result {
            Ok(Some(frame)) => ctx.frame_sink.on_frame(frame),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(target: "livepull_media::video", error = %e, "decode error");
                ctx.status_sink.on_error(&format!("decode error: {e}"));
            }
        }
    }
}
