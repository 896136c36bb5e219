// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Direct messages between two users.
//!
//! Messages arrive from two independent sources (the hub push channel and the
//! request/response API) as [`WireMessage`] values. A wire message becomes a
//! [`Message`] only once it carries a server identity and a sent timestamp;
//! anything else is malformed and never enters the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::user::UserId;

/// Server-assigned message identity. Unique once confirmed.
pub type MessageId = i64;

/// A confirmed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Returns true if this message was exchanged between `a` and `b`, in
    /// either direction.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (self.sender_id == *a && self.recipient_id == *b)
            || (self.sender_id == *b && self.recipient_id == *a)
    }

    /// Returns the other party of the message from `me`'s point of view.
    pub fn peer_of(&self, me: &UserId) -> &UserId {
        if self.sender_id == *me {
            &self.recipient_id
        } else {
            &self.sender_id
        }
    }

    /// Marks the message read at `at`.
    ///
    /// Returns false if it was already read; the original read time is kept.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(at);
        true
    }
}

/// A message as delivered over the wire, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(default)]
    pub id: Option<MessageId>,
    #[serde(default)]
    pub sender_id: UserId,
    #[serde(default)]
    pub recipient_id: UserId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl TryFrom<WireMessage> for Message {
    type Error = Error;

    fn try_from(wire: WireMessage) -> Result<Self> {
        let id = wire
            .id
            .ok_or_else(|| Error::MalformedMessage("missing id".to_string()))?;
        let sent_at = wire
            .sent_at
            .ok_or_else(|| Error::MalformedMessage(format!("message {id} has no sent timestamp")))?;
        if wire.sender_id.is_empty() || wire.recipient_id.is_empty() {
            return Err(Error::MalformedMessage(format!(
                "message {id} is missing a sender or recipient"
            )));
        }

        Ok(Message {
            id,
            sender_id: wire.sender_id,
            recipient_id: wire.recipient_id,
            content: wire.content,
            sent_at,
            is_read: wire.is_read,
            read_at: wire.read_at,
        })
    }
}

impl From<Message> for WireMessage {
    fn from(msg: Message) -> Self {
        WireMessage {
            id: Some(msg.id),
            sender_id: msg.sender_id,
            recipient_id: msg.recipient_id,
            content: msg.content,
            sent_at: Some(msg.sent_at),
            is_read: msg.is_read,
            read_at: msg.read_at,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
