//! Push Client
//!
//! Owns the single push connection. Inbound envelopes are fanned out
//! through the event bus keyed by envelope type; connection loss feeds a
//! bounded linear-backoff reconnect policy that retains the original
//! credential so every retry re-authenticates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;

use crate::events::EventBus;

use super::envelope::EventEnvelope;
use super::transport::{Transport, TransportSink, TransportStream, WsTransport};

/// Reserved event key for connection status changes.
pub const CONNECTION_EVENT: &str = "connection";

/// Connection state, owned by the client and observed by consumers through
/// the [`CONNECTION_EVENT`] key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push client configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PushConfig {
    /// Push endpoint URL.
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum automatic reconnect attempts after a connection loss.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Backoff base: retry attempt `n` waits `reconnect_base_ms * n`.
    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_ms: u64,
}

fn default_url() -> String {
    "ws://localhost:8090/ws".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base() -> u64 {
    1000
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_ms: default_reconnect_base(),
        }
    }
}

/// State shared between client handles and the session task.
struct Shared<T: Transport> {
    transport: T,
    bus: EventBus,
    config: PushConfig,
    status: Mutex<ConnectionStatus>,
    /// Outbound channel into the active connection's writer, if any.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Handle for the active session task, if any.
    session: Mutex<Option<SessionHandle>>,
    next_generation: AtomicU64,
}

/// Cancellation handle plus the generation that identifies the session
/// task owning the client's connection state.
struct SessionHandle {
    cancel: watch::Sender<bool>,
    generation: u64,
}

/// Client for the real-time push connection.
///
/// One connection at a time, exclusively owned by the client's session
/// task; all writes go through [`send`](PushClient::send). Cloning yields
/// another handle to the same client.
pub struct PushClient<T: Transport = WsTransport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Clone for PushClient<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport> PushClient<T> {
    /// Create a client over `transport`, publishing events on `bus`.
    pub fn new(transport: T, bus: EventBus, config: PushConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                bus,
                config,
                status: Mutex::new(ConnectionStatus::Disconnected),
                outbound: Mutex::new(None),
                session: Mutex::new(None),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Open the push connection, authenticating with `credential`.
    ///
    /// No-op if already connected. The credential is retained by the
    /// session so automatic reconnects re-authenticate with it. Failures
    /// never surface to the caller; they feed the reconnect policy and the
    /// [`CONNECTION_EVENT`] stream. Must be called within a Tokio runtime.
    pub fn connect(&self, credential: &str) {
        let mut session = self.shared.session.lock().unwrap();
        // Only a session that is live *and* connected makes this a no-op;
        // an explicitly disconnected session has already vacated the slot.
        if session.is_some() && self.is_connected() {
            tracing::debug!("connect ignored: already connected");
            return;
        }

        // Replacing the session supersedes any previous session, whether it
        // is mid-connect or waiting out a reconnect backoff.
        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        *session = Some(SessionHandle {
            cancel: cancel_tx,
            generation,
        });
        drop(session);

        let shared = Arc::clone(&self.shared);
        let credential = credential.to_string();
        tokio::spawn(run_session(shared, credential, generation, cancel_rx));
    }

    /// Transmit `{type, payload}` if and only if currently connected.
    ///
    /// Best-effort by design: while not connected the message is silently
    /// dropped, with no error and no queueing.
    pub fn send(&self, event: &str, payload: Value) {
        if self.status() != ConnectionStatus::Connected {
            tracing::debug!(event = %event, "Dropping send while not connected");
            return;
        }

        let envelope = EventEnvelope::new(event, payload);
        let text = match serde_json::to_string(&envelope) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "Failed to encode envelope");
                return;
            }
        };

        let outbound = self.shared.outbound.lock().unwrap();
        match outbound.as_ref() {
            Some(tx) => {
                if tx.send(text).is_err() {
                    tracing::debug!(event = %event, "Dropping send: connection closing");
                }
            }
            None => tracing::debug!(event = %event, "Dropping send while not connected"),
        }
    }

    /// Close the active connection, if any.
    ///
    /// Idempotent. Explicit disconnect is terminal: it never triggers the
    /// reconnect policy, and a pending reconnect wait is cancelled.
    pub fn disconnect(&self) {
        let session = self.shared.session.lock().unwrap().take();
        let Some(handle) = session else {
            return;
        };
        let _ = handle.cancel.send(true);
        self.shared.outbound.lock().unwrap().take();

        // The transition happens here, synchronously, so a connect issued
        // right after sees the client as disconnected. The vacated slot
        // keeps the cancelled task from touching client state later.
        set_status(&self.shared, ConnectionStatus::Disconnected);
        self.shared
            .bus
            .dispatch(CONNECTION_EVENT, &json!({"status": "disconnected"}));
        tracing::info!("Push connection closed by client");
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.lock().unwrap()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }
}

fn set_status<T: Transport>(shared: &Shared<T>, status: ConnectionStatus) {
    *shared.status.lock().unwrap() = status;
}

/// Whether the session identified by `generation` still owns the client's
/// connection state.
fn is_current<T: Transport>(shared: &Shared<T>, generation: u64) -> bool {
    shared
        .session
        .lock()
        .unwrap()
        .as_ref()
        .map_or(false, |handle| handle.generation == generation)
}

#[derive(Debug, PartialEq)]
enum SessionExit {
    /// Connection closed from the transport side.
    Closed,
    /// Cancelled by an explicit disconnect or a superseding connect.
    Cancelled,
}

/// One session: connect, pump messages, and on loss walk the retry
/// schedule until it succeeds, is cancelled, or exhausts the cap.
async fn run_session<T: Transport>(
    shared: Arc<Shared<T>>,
    credential: String,
    generation: u64,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;

    loop {
        if !is_current(&shared, generation) {
            return;
        }

        match shared
            .transport
            .connect(&shared.config.url, &credential)
            .await
        {
            Ok((mut sink, stream)) => {
                if !is_current(&shared, generation) {
                    // Cancelled while the attempt was in flight; the fresh
                    // connection must not surface as connected.
                    sink.close().await;
                    tracing::info!("Discarding connection opened by a cancelled session");
                    return;
                }
                attempt = 0;

                let (tx, rx) = mpsc::unbounded_channel();
                *shared.outbound.lock().unwrap() = Some(tx);
                set_status(&shared, ConnectionStatus::Connected);
                shared
                    .bus
                    .dispatch(CONNECTION_EVENT, &json!({"status": "connected"}));
                tracing::info!(url = %shared.config.url, "Push connection established");

                let writer = tokio::spawn(write_loop(sink, rx));
                let exit = read_loop(&shared.bus, stream, &mut cancel_rx).await;

                // An explicit disconnect or a superseding connect already
                // owns the shared state; only the current session may touch
                // it. Dropping the outbound sender lets the writer drain and
                // close the sink.
                let current = is_current(&shared, generation);
                if current {
                    shared.outbound.lock().unwrap().take();
                    set_status(&shared, ConnectionStatus::Disconnected);
                    shared
                        .bus
                        .dispatch(CONNECTION_EVENT, &json!({"status": "disconnected"}));
                }
                let _ = writer.await;

                if exit == SessionExit::Cancelled || !current {
                    return;
                }
                tracing::warn!("Push connection lost");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Push connect attempt failed");
            }
        }

        attempt += 1;
        if attempt > shared.config.max_reconnect_attempts {
            let exhausted_as_current = {
                let mut session = shared.session.lock().unwrap();
                let owned = session
                    .as_ref()
                    .map_or(false, |handle| handle.generation == generation);
                if owned {
                    // Vacate the slot so a later connect starts fresh.
                    session.take();
                }
                owned
            };
            if exhausted_as_current {
                set_status(&shared, ConnectionStatus::Disconnected);
                shared.bus.dispatch(
                    CONNECTION_EVENT,
                    &json!({"status": "disconnected", "reason": "retries_exhausted"}),
                );
                tracing::warn!(
                    attempts = shared.config.max_reconnect_attempts,
                    "Reconnect attempts exhausted; staying disconnected until connect is called again"
                );
            }
            return;
        }

        if !is_current(&shared, generation) {
            return;
        }
        set_status(&shared, ConnectionStatus::Reconnecting);
        shared.bus.dispatch(
            CONNECTION_EVENT,
            &json!({"status": "reconnecting", "attempt": attempt}),
        );

        let delay = Duration::from_millis(shared.config.reconnect_base_ms * u64::from(attempt));
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            // Explicit disconnect surfaces status and the connection event
            // synchronously; a superseding connect owns state from here on.
            _ = cancel_rx.changed() => return,
        }
    }
}

/// Pump inbound messages into the bus until the connection closes or the
/// session is cancelled.
async fn read_loop<S: TransportStream>(
    bus: &EventBus,
    mut stream: S,
    cancel_rx: &mut watch::Receiver<bool>,
) -> SessionExit {
    loop {
        tokio::select! {
            _ = cancel_rx.changed() => return SessionExit::Cancelled,
            inbound = stream.next_message() => match inbound {
                Some(Ok(text)) => handle_inbound(bus, &text),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Push receive error");
                    return SessionExit::Closed;
                }
                None => return SessionExit::Closed,
            }
        }
    }
}

/// Forward queued outbound messages to the sink, then close it.
async fn write_loop<K: TransportSink>(mut sink: K, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(text) = rx.recv().await {
        if let Err(e) = sink.send(text).await {
            tracing::warn!(error = %e, "Push send failed");
            break;
        }
    }
    sink.close().await;
}

/// Decode one inbound payload and fan it out by envelope type.
///
/// Malformed payloads are dropped and logged; they never reach subscribers
/// and never close the connection.
fn handle_inbound(bus: &EventBus, text: &str) {
    match serde_json::from_str::<EventEnvelope>(text) {
        Ok(envelope) => {
            let delivered = bus.dispatch(&envelope.event, &envelope.payload);
            tracing::trace!(event = %envelope.event, delivered, "Dispatched push event");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Dropping malformed push payload");
        }
    }
}
