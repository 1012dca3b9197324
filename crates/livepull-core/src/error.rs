//! Error kinds, not exception types — a typed discriminant so callers can
//! branch on *kind*, not parse a message.
//!
//! A reconnecting network client needs its caller to tell "retry this" apart
//! from "give up", so the public boundary here is a `thiserror` enum rather
//! than a bag of strings; internal plumbing still uses `anyhow` where the
//! caller only needs to propagate, not branch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("open error: {0}")]
    Open(String),

    #[error("codec setup error: {0}")]
    CodecSetup(String),

    #[error("transient read error: {0}")]
    TransientRead(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("audio setup error: {0}")]
    AudioSetup(String),

    #[error("reconnect budget exhausted after {attempts} attempt(s)")]
    TerminalRetryExhausted { attempts: u32 },
}

impl PlayerError {
    /// True for kinds that the demux/reconnect loop treats as session-fatal
    /// (clears `running` and drains the stages) rather than recoverable
    /// in-place (skip one packet, try the next).
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, PlayerError::TerminalRetryExhausted { .. } | PlayerError::Config(_))
    }
}
