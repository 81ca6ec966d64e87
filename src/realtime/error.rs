//! Realtime Error Types

use thiserror::Error;

use super::messages::EventKind;

/// Errors raised by the realtime connection itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// Handshake with the realtime endpoint failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// An established connection broke
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A frame or payload that could not be decoded
///
/// These are dropped by the dispatcher and never surfaced to the operator.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed frame: {0}")]
    Frame(#[from] serde_json::Error),

    #[error("Unexpected payload for {kind}: {error}")]
    Payload {
        kind: EventKind,
        error: serde_json::Error,
    },
}
