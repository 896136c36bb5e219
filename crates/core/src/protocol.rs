// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging hub protocol.
//!
//! The hub is a bidirectional channel keyed by the session's bearer
//! credential:
//! - Server pushes message deltas, read receipts and typing signals
//! - Client invokes start/stop typing toward a peer
//!
//! Frames are JSON text tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::WireMessage;
use crate::user::UserId;

/// Invocations sent from client to hub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The local user started typing toward a peer.
    StartTyping {
        #[serde(rename = "peerId")]
        peer_id: UserId,
    },

    /// The local user stopped typing toward a peer.
    StopTyping {
        #[serde(rename = "peerId")]
        peer_id: UserId,
    },
}

/// Events pushed from hub to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A peer sent a message to the local user.
    MessageReceived(WireMessage),

    /// Echo of a message the local user sent.
    ///
    /// May duplicate the direct response to the send call.
    MessageSendConfirmed(WireMessage),

    /// A peer read the messages the local user sent them.
    MessagesMarkedRead {
        #[serde(rename = "readerId")]
        reader_id: UserId,
    },

    /// A peer started typing toward the local user.
    TypingStarted {
        #[serde(rename = "peerId")]
        peer_id: UserId,
    },

    /// A peer stopped typing toward the local user.
    TypingStopped {
        #[serde(rename = "peerId")]
        peer_id: UserId,
    },
}

impl ClientMessage {
    /// Creates a StartTyping invocation.
    pub fn start_typing(peer_id: UserId) -> Self {
        ClientMessage::StartTyping { peer_id }
    }

    /// Creates a StopTyping invocation.
    pub fn stop_typing(peer_id: UserId) -> Self {
        ClientMessage::StopTyping { peer_id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

impl ServerMessage {
    pub fn message_received(message: WireMessage) -> Self {
        ServerMessage::MessageReceived(message)
    }

    pub fn message_send_confirmed(message: WireMessage) -> Self {
        ServerMessage::MessageSendConfirmed(message)
    }

    pub fn messages_marked_read(reader_id: UserId) -> Self {
        ServerMessage::MessagesMarkedRead { reader_id }
    }

    pub fn typing_started(peer_id: UserId) -> Self {
        ServerMessage::TypingStarted { peer_id }
    }

    pub fn typing_stopped(peer_id: UserId) -> Self {
        ServerMessage::TypingStopped { peer_id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
