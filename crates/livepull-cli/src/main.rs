//! Thin operator binary standing in for a GUI: wires a real `AudioSink`
//! (`cpal`), terminal `StatusSink`/`StatsSink` (`tracing`), and a
//! frame-counting `FrameSink` to a `Player`. `clap` replaces the URL/retry
//! input form a GUI would otherwise provide.

mod audio_out;
mod sinks;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use livepull_core::PlayerConfig;
use livepull_media::{FfmpegInputOpener, Player};

use audio_out::CpalAudioSink;
use sinks::{CountingFrameSink, TracingStatsSink, TracingStatusSink};

#[derive(Parser, Debug)]
#[command(name = "livepull", about = "Pull-mode live stream playback client")]
struct Args {
    /// RTSP/RTMP/HTTP(S) URL to play.
    #[arg(long)]
    url: String,

    /// JSON config file to load as a base `PlayerConfig` (missing fields
    /// fall back to their defaults); `--max-attempts`/`--reconnect-delay-ms`
    /// override whatever it sets.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Maximum reconnect attempts (0 = no retries).
    #[arg(long)]
    max_attempts: Option<i64>,

    /// Delay between reconnect attempts, in milliseconds.
    #[arg(long)]
    reconnect_delay_ms: Option<i64>,
}

fn load_config(args: &Args) -> anyhow::Result<PlayerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => PlayerConfig::default(),
    };
    if let Some(n) = args.max_attempts {
        config.max_reconnect_attempts = n.max(0) as u32;
    }
    if let Some(ms) = args.reconnect_delay_ms {
        config.reconnect_delay_ms = ms.max(0) as u64;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let frame_sink = Arc::new(CountingFrameSink::default());
    let player = Arc::new(Player::new(
        config,
        Arc::new(FfmpegInputOpener),
        Box::new(|| Box::new(CpalAudioSink::new())),
        frame_sink.clone(),
        Arc::new(TracingStatusSink),
        Arc::new(TracingStatsSink),
    ));

    let running = Arc::new(AtomicBool::new(true));
    let ctrlc_running = running.clone();
    ctrlc::set_handler(move || {
        tracing::info!(target: "livepull_cli", "received interrupt, stopping");
        ctrlc_running.store(false, Ordering::SeqCst);
    })?;

    player.start(&args.url)?;

    while running.load(Ordering::SeqCst) && player.is_running() {
        std::thread::sleep(Duration::from_millis(100));
    }

    player.stop();
    while player.is_running() {
        std::thread::sleep(Duration::from_millis(20));
    }

    tracing::info!(target: "livepull_cli", frames = frame_sink.count(), "session ended");
    Ok(())
}
