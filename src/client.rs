//! Client Facade
//!
//! Constructs the event bus, push client, and notification center once and
//! hands out references. Nothing is process-global: dependents receive
//! explicitly owned handles.

use tokio::time::Duration;

use crate::config::Config;
use crate::events::EventBus;
use crate::notify::NotificationCenter;
use crate::push::{PushClient, WsTransport};

/// Owner of the Emberlink client services.
///
/// The push client publishes onto the same [`EventBus`] returned by
/// [`events`](EmberClient::events), so subscribing there observes both
/// server events and `connection` status changes.
pub struct EmberClient {
    config: Config,
    bus: EventBus,
    push: PushClient<WsTransport>,
    notifications: NotificationCenter,
}

impl EmberClient {
    /// Construct all services from `config`.
    pub fn new(config: Config) -> Self {
        let bus = EventBus::new();
        let push = PushClient::new(WsTransport, bus.clone(), config.push.clone());
        let notifications =
            NotificationCenter::new(Duration::from_millis(config.notify.dismiss_after_ms));

        Self {
            config,
            bus,
            push,
            notifications,
        }
    }

    /// The shared event registry.
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// The real-time push client.
    pub fn push(&self) -> &PushClient<WsTransport> {
        &self.push
    }

    /// The user-facing notification queue.
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the push connection with `credential`. See
    /// [`PushClient::connect`].
    pub fn connect(&self, credential: &str) {
        self.push.connect(credential);
    }

    /// Close the push connection. See [`PushClient::disconnect`].
    pub fn disconnect(&self) {
        self.push.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_services_share_one_bus() {
        let client = EmberClient::new(Config::default());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = client.events().subscribe("new_match", move |payload| {
            sink.lock().unwrap().push(payload.clone());
        });

        client.events().dispatch("new_match", &json!({"user_id": 1}));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notification_flow_through_facade() {
        let client = EmberClient::new(Config::default());

        let id = client.notifications().error("Login failed");
        assert_eq!(client.notifications().len(), 1);

        client.notifications().remove(id);
        assert!(client.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_delay_comes_from_config() {
        let mut config = Config::default();
        config.notify.dismiss_after_ms = 1;
        let client = EmberClient::new(config);

        client.notifications().success("gone soon");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(client.notifications().is_empty());
    }
}
