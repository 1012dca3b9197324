//! Bounded retry bookkeeping embedded in the demux stage: attempt counter,
//! fixed inter-attempt delay, terminal give-up once the budget is spent.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

/// How long a single `sleep_interruptible` chunk waits before re-checking
/// the stop flags.
const POLL_CHUNK: Duration = Duration::from_millis(20);

pub struct ReconnectController {
    max_attempts: AtomicU32,
    delay_ms: AtomicU64,
    attempts: AtomicU32,
}

impl ReconnectController {
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts: AtomicU32::new(max_attempts),
            delay_ms: AtomicU64::new(delay_ms),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn set_max_attempts(&self, n: u32) {
        self.max_attempts.store(n, Ordering::Relaxed);
    }

    pub fn set_delay_ms(&self, ms: u64) {
        self.delay_ms.store(ms, Ordering::Relaxed);
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.load(Ordering::Relaxed)
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms.load(Ordering::Relaxed)
    }

    /// A successful open resets the counter to zero.
    pub fn reset(&self) {
        let previous = self.attempts.swap(0, Ordering::Relaxed);
        if previous > 0 {
            tracing::debug!(target: "livepull_media::reconnect", previous, "attempt counter reset");
        }
    }

    /// Increments the failure counter and returns the new count.
    pub fn record_failure(&self) -> u32 {
        let count = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(target: "livepull_media::reconnect", attempt = count, "recorded failure");
        count
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Sleeps `delay_ms` in small chunks so a stop request is observed
    /// promptly, rather than blocking the whole delay in one `sleep` call.
    pub fn sleep_interruptible(&self, running: &AtomicBool, stop_requested: &AtomicBool) {
        let total = Duration::from_millis(self.delay_ms());
        let mut slept = Duration::ZERO;
        while slept < total {
            if !running.load(Ordering::Relaxed) || stop_requested.load(Ordering::Relaxed) {
                return;
            }
            let step = (total - slept).min(POLL_CHUNK);
            thread::sleep(step);
            slept += step;
        }
    }
}
