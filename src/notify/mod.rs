//! User-Facing Notifications
//!
//! An ordered, newest-first queue of user-visible notices. Every mutation
//! fans the full updated list out to subscribers; non-persistent notices
//! auto-dismiss after a fixed delay. Errors default to persistent so they
//! never vanish unseen.
//!
//! ## Example
//!
//! ```
//! use emberlink::notify::{Notice, NotificationCenter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let center = NotificationCenter::default();
//!
//!     let _sub = center.subscribe(|list| {
//!         println!("{} notifications", list.len());
//!     });
//!
//!     center.success("Profile saved");
//!     let id = center.push(Notice::error("Login failed").details("401 Unauthorized"));
//!     center.remove(id);
//! }
//! ```

mod center;
mod types;

pub use center::{NotificationCenter, NotifySubscription};
pub use types::{Notice, Notification, NotificationKind};
