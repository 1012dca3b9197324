//! The audio decoder thread: pop a packet, decode under the Context Mutex,
//! resample every produced frame, and forward it to the owner thread's
//! pending-audio FIFO instead of writing to a sink inline.

use crate::owner::OwnerCmd;
use crate::session::AudioStageContext;

pub fn run(ctx: AudioStageContext) {
    tracing::debug!(target: "livepull_media::audio", "audio stage started");
    loop {
        let Some(packet) = ctx.audio_queue.pop(&ctx.running) else {
            tracing::debug!(target: "livepull_media::audio", "audio stage exiting");
            return;
        };

        let mut guard = ctx.decoder_ctx.lock();
        let Some(decoder) = guard.audio.as_mut() else {
            continue;
        };

        let result = decoder.decode(&packet);
        drop(guard);

        match result {
            Ok(buffers) => {
                for buf in buffers {
                    let _ = ctx.owner_tx.send(OwnerCmd::PushAudio(buf));
                }
            }
            Err(e) => {
                tracing::warn!(target: "livepull_media::audio", error = %e, "decode error");
                ctx.status_sink.on_error(&format!("decode error: {e}"));
            }
        }
    }
}
