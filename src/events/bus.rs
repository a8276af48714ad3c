//! Subscription Registry
//!
//! Maps event-type keys to callback sets and fans dispatched payloads out to
//! every callback currently registered for the key. Registrations are
//! identified by generated tokens, so the same closure can be registered
//! more than once and each registration is removable independently.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

/// Callback invoked with the payload of each dispatched event.
type Callback = Arc<dyn Fn(&Value) + Send + Sync + 'static>;

/// Registry state: per-key subscriber lists plus the token counter.
struct BusInner {
    next_token: u64,
    channels: HashMap<String, Vec<(u64, Callback)>>,
}

/// Shared event registry with fan-out dispatch.
///
/// Cloning an `EventBus` yields another handle to the same registry. State
/// is process-lifetime only: there is no replay of missed events to late
/// subscribers.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                next_token: 0,
                channels: HashMap::new(),
            })),
        }
    }

    /// Register `callback` under `key`.
    ///
    /// Returns a [`Subscription`] that removes exactly this registration
    /// when consumed. Dropping the handle without calling
    /// [`Subscription::unsubscribe`] leaves the registration active.
    pub fn subscribe(
        &self,
        key: &str,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.inner.lock().unwrap();
        let token = inner.next_token;
        inner.next_token += 1;

        inner
            .channels
            .entry(key.to_string())
            .or_default()
            .push((token, Arc::new(callback)));

        tracing::trace!(key = %key, token, "Subscribed");

        Subscription {
            key: key.to_string(),
            token,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every callback currently registered under `key` with
    /// `payload`. Returns the number of callbacks invoked.
    ///
    /// Callbacks run synchronously, outside the registry lock, so they may
    /// freely subscribe, unsubscribe, or dispatch; such changes affect only
    /// subsequent dispatches. A panicking callback is caught and logged and
    /// does not prevent the remaining callbacks from running.
    pub fn dispatch(&self, key: &str, payload: &Value) -> usize {
        let callbacks: Vec<Callback> = {
            let inner = self.inner.lock().unwrap();
            match inner.channels.get(key) {
                Some(subs) => subs.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => Vec::new(),
            }
        };

        for callback in &callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                tracing::error!(key = %key, "Subscriber panicked during dispatch");
            }
        }

        callbacks.len()
    }

    /// Number of callbacks currently registered under `key`.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .channels
            .get(key)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsubscribe capability returned by [`EventBus::subscribe`].
pub struct Subscription {
    key: String,
    token: u64,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    /// Remove this registration from the bus.
    ///
    /// No-op if the bus has already been dropped. Takes effect for future
    /// dispatches; a dispatch already in progress for this subscriber is
    /// not interrupted.
    pub fn unsubscribe(self) {
        let Some(inner) = self.bus.upgrade() else {
            return;
        };

        let mut inner = inner.lock().unwrap();
        if let Some(subs) = inner.channels.get_mut(&self.key) {
            subs.retain(|(token, _)| *token != self.token);
            if subs.is_empty() {
                inner.channels.remove(&self.key);
            }
        }

        tracing::trace!(key = %self.key, token = self.token, "Unsubscribed");
    }
}
