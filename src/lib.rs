//! # Emberlink Client Core
//!
//! The real-time client core of the Emberlink dating app: typed server
//! push over one WebSocket connection, an event fan-out registry, and a
//! queue of auto-expiring user-facing notifications.
//!
//! ## Features
//!
//! - **Event fan-out**: token-based subscriptions with per-callback panic
//!   isolation
//! - **Push client**: one authenticated connection, bounded linear-backoff
//!   reconnect, best-effort send
//! - **Notifications**: newest-first queue with auto-dismiss; errors stay
//!   until dismissed
//! - **Explicit ownership**: services are constructed once and passed by
//!   handle, never held as globals
//!
//! ## Modules
//!
//! - [`events`]: Subscription registry and dispatch
//! - [`push`]: WebSocket push client and transport seam
//! - [`notify`]: User-facing notification queue
//! - [`client`]: Facade wiring the services together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emberlink::{Config, EmberClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load_default();
//!     emberlink::init_logging(&config.logging);
//!
//!     let client = EmberClient::new(config);
//!
//!     // Server events arrive keyed by envelope type.
//!     let _matches = client.events().subscribe("new_match", |payload| {
//!         println!("new match: {payload}");
//!     });
//!     let _status = client.events().subscribe("connection", |payload| {
//!         println!("connection: {payload}");
//!     });
//!
//!     client.connect("session-token");
//!
//!     let id = client.notifications().success("Profile saved");
//!     client.notifications().remove(id);
//! }
//! ```

pub mod client;
pub mod config;
pub mod events;
pub mod logging;
pub mod notify;
pub mod push;

// Re-export top-level types for convenience
pub use client::EmberClient;

pub use config::{Config, ConfigError, LoggingConfig, NotifyConfig};

pub use events::{EventBus, Subscription};

pub use notify::{Notice, Notification, NotificationCenter, NotificationKind, NotifySubscription};

pub use push::{
    ConnectionStatus, EventEnvelope, PushClient, PushConfig, PushError, Transport, TransportSink,
    TransportStream, WsTransport, CONNECTION_EVENT,
};

pub use logging::init_logging;
