//! Transport Seam
//!
//! The connection-oriented, message-based channel the push client runs
//! over: connect with url + credential, then an independent sink and stream
//! of text messages. Production uses `tokio-tungstenite`; tests substitute
//! a scripted in-memory transport.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::error::PushError;

/// Factory for push connections.
///
/// The credential authenticates the connection as a connection parameter
/// (appended to the URL), not a header, so an automatic reconnect can
/// re-authenticate with the credential retained by the session.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Sink: TransportSink;
    type Stream: TransportStream;

    /// Open one connection to `url`, authenticated with `credential`.
    async fn connect(
        &self,
        url: &str,
        credential: &str,
    ) -> Result<(Self::Sink, Self::Stream), PushError>;
}

/// Write half of a push connection.
#[async_trait]
pub trait TransportSink: Send + 'static {
    /// Transmit one text message.
    async fn send(&mut self, text: String) -> Result<(), PushError>;

    /// Close the connection. Errors on close are ignored.
    async fn close(&mut self);
}

/// Read half of a push connection.
#[async_trait]
pub trait TransportStream: Send + 'static {
    /// Receive the next text message. `None` means the connection closed.
    async fn next_message(&mut self) -> Option<Result<String, PushError>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport over `tokio-tungstenite`.
pub struct WsTransport;

/// Write half of a live WebSocket connection.
pub struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

/// Read half of a live WebSocket connection.
pub struct WsSource {
    inner: SplitStream<WsStream>,
}

/// Append the credential to the connection URL as a query parameter.
fn authenticated_url(url: &str, credential: &str) -> String {
    if url.contains('?') {
        format!("{}&token={}", url, credential)
    } else {
        format!("{}?token={}", url, credential)
    }
}

#[async_trait]
impl Transport for WsTransport {
    type Sink = WsSink;
    type Stream = WsSource;

    async fn connect(
        &self,
        url: &str,
        credential: &str,
    ) -> Result<(Self::Sink, Self::Stream), PushError> {
        let request_url = authenticated_url(url, credential);
        let (stream, _response) = connect_async(request_url.as_str())
            .await
            .map_err(|e| PushError::Connect(e.to_string()))?;

        let (sink, stream) = stream.split();
        Ok((WsSink { inner: sink }, WsSource { inner: stream }))
    }
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, text: String) -> Result<(), PushError> {
        self.inner
            .send(Message::Text(text))
            .await
            .map_err(|e| PushError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.inner.send(Message::Close(None)).await;
        let _ = self.inner.close().await;
    }
}

#[async_trait]
impl TransportStream for WsSource {
    async fn next_message(&mut self) -> Option<Result<String, PushError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                // Control frames and binary payloads carry no envelopes.
                Ok(_) => continue,
                Err(e) => return Some(Err(PushError::Receive(e.to_string()))),
            }
        }
    }
}
