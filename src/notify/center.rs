//! Notification Center
//!
//! Owns the notification list and its subscribers. Mutations happen only
//! through the documented operations; each one that changes the list fans
//! the full updated list out to every subscriber synchronously.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::time::Duration;
use uuid::Uuid;

use super::types::{Notice, Notification};

/// Subscriber callback: receives the full current list on every mutation.
type ListCallback = Arc<dyn Fn(&[Notification]) + Send + Sync + 'static>;

struct CenterState {
    /// Newest-first.
    notices: Vec<Notification>,
    subscribers: Vec<(u64, ListCallback)>,
    next_token: u64,
}

struct Inner {
    state: Mutex<CenterState>,
    dismiss_after: Duration,
}

/// Queue of user-visible notifications with auto-expiry.
///
/// Cloning yields another handle to the same queue. Non-persistent notices
/// are removed automatically after the configured delay, so
/// [`push`](NotificationCenter::push) and its convenience wrappers must be
/// called within a Tokio runtime.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// Create a center whose non-persistent notices dismiss after
    /// `dismiss_after`.
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CenterState {
                    notices: Vec::new(),
                    subscribers: Vec::new(),
                    next_token: 0,
                }),
                dismiss_after,
            }),
        }
    }

    /// Insert a notification built from `notice` and return its id.
    ///
    /// The notification is prepended (newest-first), the updated list is
    /// fanned out, and unless the notice is persistent its removal is
    /// scheduled after the dismiss delay. A scheduled removal that finds
    /// the notification already gone is a no-op.
    pub fn push(&self, notice: Notice) -> Uuid {
        let persistent = notice.is_persistent();
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: notice.kind,
            message: notice.message,
            details: notice.details,
            timestamp: Utc::now(),
            read: false,
            persistent,
        };
        let id = notification.id;

        tracing::debug!(id = %id, kind = %notification.kind, persistent, "Notification added");

        let (list, subscribers) = {
            let mut state = self.inner.state.lock().unwrap();
            state.notices.insert(0, notification);
            snapshot(&state)
        };
        fan_out(&list, &subscribers);

        if !persistent {
            let inner = Arc::downgrade(&self.inner);
            let delay = self.inner.dismiss_after;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(inner) = inner.upgrade() {
                    remove_by_id(&inner, id);
                }
            });
        }

        id
    }

    /// Convenience: push a success notice.
    pub fn success(&self, message: &str) -> Uuid {
        self.push(Notice::success(message))
    }

    /// Convenience: push an error notice (persistent by default).
    pub fn error(&self, message: &str) -> Uuid {
        self.push(Notice::error(message))
    }

    /// Convenience: push a warning notice.
    pub fn warning(&self, message: &str) -> Uuid {
        self.push(Notice::warning(message))
    }

    /// Convenience: push an info notice.
    pub fn info(&self, message: &str) -> Uuid {
        self.push(Notice::info(message))
    }

    /// Remove the notification with `id` and fan out the updated list.
    /// No-op (and no fan-out) if it is not present.
    pub fn remove(&self, id: Uuid) {
        remove_by_id(&self.inner, id);
    }

    /// Mark the notification with `id` as read and fan out the updated
    /// list. No-op (and no fan-out) if it is not present.
    pub fn mark_read(&self, id: Uuid) {
        let fanned = {
            let mut state = self.inner.state.lock().unwrap();
            match state.notices.iter_mut().find(|n| n.id == id) {
                Some(notice) => {
                    notice.read = true;
                    Some(snapshot(&state))
                }
                None => None,
            }
        };

        if let Some((list, subscribers)) = fanned {
            tracing::debug!(id = %id, "Notification marked read");
            fan_out(&list, &subscribers);
        }
    }

    /// Register a subscriber for list updates.
    ///
    /// The callback receives the full current list (not a diff) on every
    /// mutation. Dropping the returned handle without calling
    /// [`NotifySubscription::unsubscribe`] leaves the registration active.
    pub fn subscribe(
        &self,
        callback: impl Fn(&[Notification]) + Send + Sync + 'static,
    ) -> NotifySubscription {
        let mut state = self.inner.state.lock().unwrap();
        let token = state.next_token;
        state.next_token += 1;
        state.subscribers.push((token, Arc::new(callback)));

        NotifySubscription {
            token,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Snapshot of the current list, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.state.lock().unwrap().notices.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().unwrap().notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NotificationCenter {
    /// Center with the stock 5 second dismiss delay.
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

fn snapshot(state: &CenterState) -> (Vec<Notification>, Vec<ListCallback>) {
    (
        state.notices.clone(),
        state.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
    )
}

/// Invoke every subscriber outside the lock; a panicking subscriber is
/// caught and logged and does not block the others.
fn fan_out(list: &[Notification], subscribers: &[ListCallback]) {
    for callback in subscribers {
        if catch_unwind(AssertUnwindSafe(|| callback(list))).is_err() {
            tracing::error!("Notification subscriber panicked");
        }
    }
}

fn remove_by_id(inner: &Inner, id: Uuid) {
    let fanned = {
        let mut state = inner.state.lock().unwrap();
        let before = state.notices.len();
        state.notices.retain(|n| n.id != id);
        if state.notices.len() != before {
            Some(snapshot(&state))
        } else {
            None
        }
    };

    if let Some((list, subscribers)) = fanned {
        tracing::debug!(id = %id, "Notification removed");
        fan_out(&list, &subscribers);
    }
}

/// Unsubscribe capability returned by [`NotificationCenter::subscribe`].
pub struct NotifySubscription {
    token: u64,
    inner: Weak<Inner>,
}

impl NotifySubscription {
    /// Remove this subscriber. No-op if the center is gone.
    pub fn unsubscribe(self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.state.lock().unwrap();
        state.subscribers.retain(|(token, _)| *token != self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::types::NotificationKind;

    fn counting_center() -> (NotificationCenter, Arc<Mutex<Vec<Vec<Notification>>>>) {
        let center = NotificationCenter::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _ = center.subscribe(move |list| {
            sink.lock().unwrap().push(list.to_vec());
        });
        (center, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_persistent_notice_auto_dismisses() {
        let center = NotificationCenter::default();
        center.success("Saved");

        // Present just before the delay elapses.
        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(center.len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_never_auto_dismisses() {
        let (center, seen) = counting_center();
        let id = center.error("Login failed");

        let list = center.notifications();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, NotificationKind::Error);
        assert!(list[0].persistent);
        assert!(!list[0].read);

        // Ten minutes idle: still present.
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(center.len(), 1);

        center.remove(id);
        assert!(center.is_empty());
        assert!(seen.lock().unwrap().last().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_then_remove_fans_out_exactly_twice() {
        let (center, seen) = counting_center();

        let id = center.success("Saved");
        center.remove(id);
        assert_eq!(seen.lock().unwrap().len(), 2);

        // The dead auto-dismiss timer finds nothing and stays silent.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_unknown_id_is_silent() {
        let (center, seen) = counting_center();
        center.error("kept");

        center.remove(Uuid::new_v4());

        assert_eq!(center.len(), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_read() {
        let (center, seen) = counting_center();
        let id = center.info("New like");

        center.mark_read(id);
        assert!(center.notifications()[0].read);
        assert_eq!(seen.lock().unwrap().len(), 2);

        // Unknown id: no mutation, no fan-out.
        center.mark_read(Uuid::new_v4());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newest_first_with_unique_ids() {
        let center = NotificationCenter::default();
        let first = center.error("first");
        let second = center.error("second");

        let list = center.notifications();
        assert_eq!(list[0].id, second);
        assert_eq!(list[1].id, first);
        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_overrides() {
        let center = NotificationCenter::default();
        center.push(Notice::error("transient").persistent(false));
        center.push(Notice::success("sticky").persistent(true));

        tokio::time::sleep(Duration::from_secs(60)).await;

        let list = center.notifications();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message, "sticky");
    }

    #[tokio::test(start_paused = true)]
    async fn test_details_are_kept() {
        let center = NotificationCenter::default();
        center.push(Notice::error("Login failed").details("401 Unauthorized"));

        assert_eq!(
            center.notifications()[0].details.as_deref(),
            Some("401 Unauthorized")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_stops_updates() {
        let center = NotificationCenter::default();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let sub = center.subscribe(move |_| {
            *sink.lock().unwrap() += 1;
        });

        center.error("one");
        sub.unsubscribe();
        center.error("two");

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_subscriber_is_isolated() {
        let center = NotificationCenter::default();
        let _ = center.subscribe(|_| panic!("bad subscriber"));
        let (tx, rx) = std::sync::mpsc::channel();
        let _ = center.subscribe(move |list| {
            let _ = tx.send(list.len());
        });

        center.error("still delivered");

        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_dismiss_delay() {
        let center = NotificationCenter::new(Duration::from_millis(100));
        center.info("fleeting");

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(center.len(), 1);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(center.is_empty());
    }
}
