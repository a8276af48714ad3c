//! Real-Time Push Client
//!
//! Maintains the single WebSocket connection to the Emberlink server,
//! decodes inbound event envelopes, and fans them out through the
//! [`EventBus`](crate::events::EventBus) by envelope type.
//!
//! ## Architecture
//!
//! - **Client**: connection lifecycle, bounded-backoff reconnect, best-effort send
//! - **Envelope**: the `{type, payload}` wire shape
//! - **Transport**: the connect/send/receive seam, implemented over
//!   `tokio-tungstenite` in production
//!
//! ## Connection events
//!
//! Status changes are published on the reserved `connection` event key:
//!
//! ```json
//! {"status": "connected"}
//! {"status": "reconnecting", "attempt": 2}
//! {"status": "disconnected", "reason": "retries_exhausted"}
//! ```

mod client;
mod envelope;
mod error;
mod transport;

pub use client::{ConnectionStatus, PushClient, PushConfig, CONNECTION_EVENT};
pub use envelope::EventEnvelope;
pub use error::PushError;
pub use transport::{Transport, TransportSink, TransportStream, WsTransport};
