//! Push transport errors.
//!
//! These surface only at the [`Transport`](super::Transport) seam. The push
//! client itself never propagates them to callers: transport failures are
//! folded into connection status transitions and the reconnect policy.

use thiserror::Error;

/// Errors produced by a transport implementation.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Failed to open transport connection: {0}")]
    Connect(String),

    #[error("Failed to send on transport: {0}")]
    Send(String),

    #[error("Transport receive failed: {0}")]
    Receive(String),
}
