// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation summaries.
//!
//! A summary is a cached, non-authoritative view of one conversation: the
//! peer, a reduced view of the last message, and the unread count as of the
//! last synchronization.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::message::{Message, MessageId, WireMessage};
use crate::user::{PeerDirectory, User, UserId};

/// Reduced view of a conversation's most recent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl From<Message> for LastMessage {
    fn from(msg: Message) -> Self {
        LastMessage {
            id: msg.id,
            sender_id: msg.sender_id,
            content: msg.content,
            sent_at: msg.sent_at,
        }
    }
}

/// A conversation summary as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub user: User,
    #[serde(default)]
    pub last_message: Option<WireMessage>,
    #[serde(default)]
    pub unread_count: i64,
}

/// A validated conversation summary sharing its peer through the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub peer: Arc<User>,
    pub last_message: Option<LastMessage>,
    pub unread_count: u32,
}

impl ConversationSummary {
    /// Validates a record and interns its peer.
    ///
    /// A record without a peer id is rejected. A malformed last message is
    /// dropped from the summary; a negative unread count is clamped to zero.
    pub fn from_record(record: ConversationRecord, peers: &mut PeerDirectory) -> Result<Self> {
        if record.user.id.is_empty() {
            return Err(Error::MalformedConversation(
                "conversation has no peer id".to_string(),
            ));
        }

        let last_message = record
            .last_message
            .and_then(|wire| Message::try_from(wire).ok())
            .map(LastMessage::from);
        let unread_count = u32::try_from(record.unread_count.max(0)).unwrap_or(u32::MAX);

        Ok(ConversationSummary {
            peer: peers.intern(record.user),
            last_message,
            unread_count,
        })
    }

    pub fn peer_id(&self) -> &UserId {
        &self.peer.id
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
