//! Event Fan-Out
//!
//! The subscription registry shared by the push client and the notification
//! center: a mapping from event-type key to the set of interested callbacks,
//! with token-based unsubscription and per-callback error isolation.
//!
//! ## Example
//!
//! ```
//! use emberlink::events::EventBus;
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let sub = bus.subscribe("new_match", |payload| {
//!     println!("matched with {}", payload["name"]);
//! });
//!
//! bus.dispatch("new_match", &json!({"name": "Sam"}));
//! sub.unsubscribe();
//! ```

mod bus;

pub use bus::{EventBus, Subscription};
