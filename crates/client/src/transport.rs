// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the messaging hub connection.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;

use courier_core::protocol::{ClientMessage, ServerMessage};

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The hub rejected the credential during the handshake.
    #[error("hub rejected the credential")]
    Unauthorized,

    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Transport trait for the hub's bidirectional channel.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Connect to the hub, presenting the bearer credential.
    fn connect<'a>(&'a mut self, url: &'a str, token: &'a str) -> TransportFuture<'a, ()>;

    /// Disconnect from the hub.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    /// Send an invocation to the hub.
    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Receive the next event from the hub.
    ///
    /// Returns `None` if the connection is closed.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    /// The WebSocket connection, if connected.
    ws: Option<WebSocketConnection>,
}

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<WsStream, tokio_tungstenite::tungstenite::Message>,
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WebSocketTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn connect<'a>(&'a mut self, url: &'a str, token: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::client::IntoClientRequest;
            use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
            use tokio_tungstenite::tungstenite::Error as WsError;

            let mut request = url
                .into_client_request()
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| TransportError::Unauthorized)?;
            request.headers_mut().insert(AUTHORIZATION, bearer);

            let ws_stream = match tokio_tungstenite::connect_async(request).await {
                Ok((ws_stream, _)) => ws_stream,
                Err(WsError::Http(response)) if response.status() == StatusCode::UNAUTHORIZED => {
                    return Err(TransportError::Unauthorized);
                }
                Err(e) => return Err(TransportError::ConnectionFailed(e.to_string())),
            };

            let (sink, stream) = ws_stream.split();
            self.ws = Some(WebSocketConnection { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                use futures_util::SinkExt;
                // Best effort: the peer may already be gone
                let _ = ws.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            let json = msg
                .to_json()
                .map_err(|e| TransportError::SerializationError(e.to_string()))?;

            if let Err(e) = ws.sink.send(Message::Text(json.into())).await {
                // Connection is broken, clear it
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let msg = ServerMessage::from_json(&text)
                            .map_err(|e| TransportError::SerializationError(e.to_string()))?;
                        return Ok(Some(msg));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        self.ws = None;
                        return Ok(None);
                    }
                    Some(Ok(_)) => {
                        // Ping/pong and binary frames carry no hub events
                        continue;
                    }
                    Some(Err(e)) => {
                        // Connection is broken, clear it
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}
