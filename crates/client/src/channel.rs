// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging hub channel.
//!
//! Owns the lifecycle of the single hub connection, never message content.
//! On unexpected closure the channel reconnects on its own, walking a fixed
//! delay sequence and holding at the last delay. Every state change is
//! published to subscribers.

use std::fmt;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use courier_core::protocol::{ClientMessage, ServerMessage};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportError, WebSocketTransport};

/// State of the hub connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Attempting the first connection.
    Connecting,
    /// Connected to the hub.
    Connected,
    /// Reconnecting after an unexpected closure.
    Reconnecting { attempt: u32 },
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connecting => f.write_str("connecting"),
            ConnectionState::Connected => f.write_str("connected"),
            ConnectionState::Reconnecting { attempt } => {
                write!(f, "reconnecting (attempt {attempt})")
            }
        }
    }
}

/// Bounded backoff: a fixed delay sequence whose last entry repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delays: Vec<Duration>,
}

impl ReconnectPolicy {
    /// Creates a policy from a delay sequence. An empty sequence retries
    /// immediately.
    pub fn new(delays: Vec<Duration>) -> Self {
        let delays = if delays.is_empty() {
            vec![Duration::ZERO]
        } else {
            delays
        };
        ReconnectPolicy { delays }
    }

    /// Delay to wait before the given 1-based reconnect attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let index = (attempt.max(1) - 1) as usize;
        let last = self.delays.len() - 1;
        self.delays[index.min(last)]
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::new(Config::default().reconnect_delays())
    }
}

/// What the channel hands to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// An event pushed by the hub.
    Hub(ServerMessage),
    /// The connection was re-established after a loss; pushes sent in the
    /// meantime were missed.
    Reconnected,
    /// The hub rejected the credential during a reconnect. The channel is
    /// disconnected and will not retry until `connect` is called again.
    ReconnectBlocked,
}

/// The single connection to the messaging hub.
pub struct HubChannel<T: Transport = WebSocketTransport> {
    url: String,
    transport: T,
    policy: ReconnectPolicy,
    /// Credential of the current session; cleared on disconnect.
    token: Option<String>,
    /// Upcoming reconnect attempt (1-based), 0 when not reconnecting.
    attempt: u32,
    /// When the upcoming reconnect attempt may start.
    retry_at: Option<Instant>,
    state_tx: watch::Sender<ConnectionState>,
    transitions_tx: broadcast::Sender<ConnectionState>,
}

impl HubChannel<WebSocketTransport> {
    /// Create a channel using the WebSocket transport.
    pub fn new(config: &Config) -> Self {
        HubChannel::with_transport(
            config.hub_url.clone(),
            ReconnectPolicy::new(config.reconnect_delays()),
            WebSocketTransport::new(),
        )
    }
}

impl<T: Transport> HubChannel<T> {
    /// Create a channel with a custom transport (for testing).
    pub fn with_transport(url: impl Into<String>, policy: ReconnectPolicy, transport: T) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (transitions_tx, _) = broadcast::channel(32);
        HubChannel {
            url: url.into(),
            transport,
            policy,
            token: None,
            attempt: 0,
            retry_at: None,
            state_tx,
            transitions_tx,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Watch the latest connection state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Receive every state transition, in order.
    pub fn transitions(&self) -> broadcast::Receiver<ConnectionState> {
        self.transitions_tx.subscribe()
    }

    /// Sender side of the transition channel, for handing out new
    /// subscriptions.
    pub fn transition_sender(&self) -> broadcast::Sender<ConnectionState> {
        self.transitions_tx.clone()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected && self.transport.is_connected()
    }

    /// True while the channel is connected or working its way back.
    pub fn is_live(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Connected | ConnectionState::Reconnecting { .. }
        )
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "hub connection state changed");
            // No subscribers is fine
            let _ = self.transitions_tx.send(state);
        }
    }

    /// Connect to the hub with the session's bearer credential.
    pub async fn connect(&mut self, token: Option<&str>) -> Result<()> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                return Err(Error::Authentication(
                    "no credential supplied".to_string(),
                ))
            }
        };

        if self.is_connected() {
            return Ok(());
        }

        self.attempt = 0;
        self.retry_at = None;
        self.set_state(ConnectionState::Connecting);

        match self.transport.connect(&self.url, &token).await {
            Ok(()) => {
                info!(url = %self.url, "connected to hub");
                self.token = Some(token);
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(TransportError::Unauthorized) => {
                self.set_state(ConnectionState::Disconnected);
                Err(Error::Authentication(
                    "hub rejected the credential".to_string(),
                ))
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "failed to connect to hub");
                self.set_state(ConnectionState::Disconnected);
                Err(e.into())
            }
        }
    }

    /// Disconnect from the hub. Always succeeds; calling it twice is a no-op.
    pub async fn disconnect(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            debug!(error = %e, "error while closing hub connection");
        }
        self.token = None;
        self.attempt = 0;
        self.retry_at = None;
        self.set_state(ConnectionState::Disconnected);
    }

    /// Send an invocation to the hub.
    ///
    /// Fails fast with `ChannelUnavailable` unless connected; nothing is
    /// queued.
    pub async fn send(&mut self, msg: ClientMessage) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::ChannelUnavailable(self.state()));
        }

        if let Err(e) = self.transport.send(msg).await {
            self.begin_reconnect(&e);
            return Err(Error::ChannelUnavailable(self.state()));
        }
        Ok(())
    }

    /// Wait for the next channel event.
    ///
    /// Drives reconnection while the connection is down. Returns `None`
    /// immediately when the channel is disconnected. Cancel-safe: a pending
    /// reconnect keeps its deadline if the future is dropped.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.state() {
                ConnectionState::Connected => match self.transport.recv().await {
                    Ok(Some(msg)) => return Some(ChannelEvent::Hub(msg)),
                    Ok(None) => self.begin_reconnect(&TransportError::ConnectionClosed),
                    Err(TransportError::SerializationError(e)) => {
                        warn!(error = %e, "skipping undecodable hub frame");
                    }
                    Err(e) => self.begin_reconnect(&e),
                },
                ConnectionState::Reconnecting { .. } => {
                    if let Some(event) = self.retry().await {
                        return Some(event);
                    }
                }
                ConnectionState::Disconnected | ConnectionState::Connecting => return None,
            }
        }
    }

    fn begin_reconnect(&mut self, cause: &TransportError) {
        warn!(error = %cause, "lost hub connection, reconnecting");
        self.attempt = 1;
        self.retry_at = None;
        self.set_state(ConnectionState::Reconnecting { attempt: 1 });
    }

    /// Make one reconnect attempt once its delay has elapsed.
    async fn retry(&mut self) -> Option<ChannelEvent> {
        let deadline = match self.retry_at {
            Some(at) => at,
            None => {
                let at = Instant::now() + self.policy.delay_for(self.attempt);
                self.retry_at = Some(at);
                at
            }
        };
        tokio::time::sleep_until(deadline).await;

        let Some(token) = self.token.clone() else {
            self.retry_at = None;
            self.set_state(ConnectionState::Disconnected);
            return Some(ChannelEvent::ReconnectBlocked);
        };

        debug!(attempt = self.attempt, "reconnecting to hub");
        // Dropped mid-connect, the elapsed deadline makes the next call retry at once
        let result = self.transport.connect(&self.url, &token).await;
        self.retry_at = None;
        match result {
            Ok(()) => {
                info!(attempt = self.attempt, "reconnected to hub");
                self.attempt = 0;
                self.set_state(ConnectionState::Connected);
                Some(ChannelEvent::Reconnected)
            }
            Err(TransportError::Unauthorized) => {
                warn!("hub rejected the credential, reconnect blocked");
                self.token = None;
                self.attempt = 0;
                self.set_state(ConnectionState::Disconnected);
                Some(ChannelEvent::ReconnectBlocked)
            }
            Err(e) => {
                warn!(attempt = self.attempt, error = %e, "reconnect attempt failed");
                self.attempt = self.attempt.saturating_add(1);
                self.set_state(ConnectionState::Reconnecting {
                    attempt: self.attempt,
                });
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
