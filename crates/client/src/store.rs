// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory source of truth for the active conversation and the
//! conversation summaries.
//!
//! Merge rules:
//! - Dedup by identity: an entry whose id is already present is a no-op, so
//!   the first arrival keeps its position
//! - Ordering: non-decreasing by sent timestamp, ties kept in arrival order
//! - Malformed entries (no id or timestamp) are dropped and reported on the
//!   event channel; the rest of the batch still applies
//! - Entries outside the active conversation are ignored
//!
//! Merge is idempotent: `merge(merge(S, A), A) == merge(S, A)`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use courier_core::{
    ConversationRecord, ConversationSummary, Message, MessageId, PeerDirectory, UserId,
    WireMessage,
};

/// Change notifications published by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The active conversation or its message list changed.
    MessagesChanged,
    /// The conversation summaries changed.
    ConversationsChanged,
    /// An inbound entry was malformed and dropped.
    Rejected(String),
}

/// Message store for one session.
pub struct MessageStore {
    me: UserId,
    active: Option<UserId>,
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
    conversations: Vec<ConversationSummary>,
    peers: PeerDirectory,
    events: broadcast::Sender<StoreEvent>,
}

impl MessageStore {
    pub fn new(me: UserId) -> Self {
        let (events, _) = broadcast::channel(64);
        MessageStore {
            me,
            active: None,
            messages: Vec::new(),
            ids: HashSet::new(),
            conversations: Vec::new(),
            peers: PeerDirectory::new(),
            events,
        }
    }

    /// The local user.
    pub fn me(&self) -> &UserId {
        &self.me
    }

    /// Subscribe to change notifications and rejected entries.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event channel, for handing out new subscriptions.
    pub fn event_sender(&self) -> broadcast::Sender<StoreEvent> {
        self.events.clone()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Peer of the active conversation.
    pub fn active(&self) -> Option<&UserId> {
        self.active.as_ref()
    }

    /// Messages of the active conversation, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn conversation(&self, peer: &UserId) -> Option<&ConversationSummary> {
        self.conversations.iter().find(|c| c.peer_id() == peer)
    }

    pub fn peers(&self) -> &PeerDirectory {
        &self.peers
    }

    /// Make `peer`'s conversation the active one.
    ///
    /// Switching to a different peer empties the message list; reopening the
    /// active peer keeps it.
    pub fn open(&mut self, peer: UserId) {
        if self.active.as_ref() == Some(&peer) {
            return;
        }
        debug!(peer = %peer, "opening conversation");
        self.active = Some(peer);
        self.messages.clear();
        self.ids.clear();
        self.emit(StoreEvent::MessagesChanged);
    }

    /// Leave the active conversation.
    pub fn close(&mut self) {
        if self.active.take().is_some() {
            self.messages.clear();
            self.ids.clear();
            self.emit(StoreEvent::MessagesChanged);
        }
    }

    /// Validate an inbound entry for the active conversation.
    fn accept(&self, wire: WireMessage) -> Option<Message> {
        let msg = match Message::try_from(wire) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "dropping malformed message");
                self.emit(StoreEvent::Rejected(e.to_string()));
                return None;
            }
        };
        let active = self.active.as_ref()?;
        if !msg.is_between(&self.me, active) {
            debug!(id = msg.id, "message outside active conversation");
            return None;
        }
        Some(msg)
    }

    /// Merge a batch of entries into the active conversation.
    ///
    /// Returns the number of entries that were new.
    pub fn merge(&mut self, incoming: Vec<WireMessage>) -> usize {
        let mut added = 0;
        for wire in incoming {
            let Some(msg) = self.accept(wire) else {
                continue;
            };
            if self.ids.insert(msg.id) {
                self.messages.push(msg);
                added += 1;
            }
        }

        if added > 0 {
            // Stable: equal timestamps keep arrival order
            self.messages.sort_by_key(|m| m.sent_at);
            self.emit(StoreEvent::MessagesChanged);
        }
        added
    }

    /// Merge a single entry. Returns true if it was new.
    pub fn append(&mut self, incoming: WireMessage) -> bool {
        self.merge(vec![incoming]) == 1
    }

    /// Replace the active conversation with a fetched snapshot.
    ///
    /// Local entries missing from the snapshot survive only if they are newer
    /// than the snapshot's latest entry; those are pushes that raced ahead of
    /// the fetch. Returns false, leaving the store untouched, if
    /// `conversation` is no longer active.
    pub fn replace(&mut self, conversation: &UserId, snapshot: Vec<WireMessage>) -> bool {
        if self.active.as_ref() != Some(conversation) {
            return false;
        }

        let mut next = Vec::with_capacity(snapshot.len());
        let mut ids = HashSet::with_capacity(snapshot.len());
        for wire in snapshot {
            if let Some(msg) = self.accept(wire) {
                if ids.insert(msg.id) {
                    next.push(msg);
                }
            }
        }

        let latest = next.iter().map(|m| m.sent_at).max();
        for local in &self.messages {
            let newer = latest.map_or(true, |at| local.sent_at > at);
            if newer && ids.insert(local.id) {
                next.push(local.clone());
            }
        }
        next.sort_by_key(|m| m.sent_at);

        self.messages = next;
        self.ids = ids;
        self.emit(StoreEvent::MessagesChanged);
        true
    }

    /// Mark messages `peer` sent to the local user as read.
    ///
    /// Returns the number of messages that changed.
    pub fn mark_read_from(&mut self, peer: &UserId, at: DateTime<Utc>) -> usize {
        let me = self.me.clone();
        self.mark_read_where(at, |m| m.sender_id == *peer && m.recipient_id == me)
    }

    /// Mark messages the local user sent to `reader` as read.
    pub fn mark_read_by(&mut self, reader: &UserId, at: DateTime<Utc>) -> usize {
        let me = self.me.clone();
        self.mark_read_where(at, |m| m.sender_id == me && m.recipient_id == *reader)
    }

    fn mark_read_where(&mut self, at: DateTime<Utc>, pred: impl Fn(&Message) -> bool) -> usize {
        let changed = self
            .messages
            .iter_mut()
            .filter(|m| pred(m))
            .map(|m| m.mark_read(at))
            .filter(|changed| *changed)
            .count();
        if changed > 0 {
            self.emit(StoreEvent::MessagesChanged);
        }
        changed
    }

    /// Unread messages from `peer` in the active list.
    pub fn unread_from(&self, peer: &UserId) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender_id == *peer && m.recipient_id == self.me && !m.is_read)
            .count()
    }

    /// Replace the conversation summaries with a fetched list.
    ///
    /// Malformed records are dropped and reported. Returns the number kept.
    pub fn set_conversations(&mut self, records: Vec<ConversationRecord>) -> usize {
        let mut next = Vec::with_capacity(records.len());
        for record in records {
            match ConversationSummary::from_record(record, &mut self.peers) {
                Ok(summary) => next.push(summary),
                Err(e) => {
                    warn!(error = %e, "dropping malformed conversation");
                    self.emit(StoreEvent::Rejected(e.to_string()));
                }
            }
        }
        let kept = next.len();
        self.conversations = next;
        self.emit(StoreEvent::ConversationsChanged);
        kept
    }

    /// Zero the cached unread count for `peer`.
    pub fn clear_unread(&mut self, peer: &UserId) {
        let mut changed = false;
        for summary in self.conversations.iter_mut().filter(|c| c.peer_id() == peer) {
            changed |= summary.unread_count != 0;
            summary.unread_count = 0;
        }
        if changed {
            self.emit(StoreEvent::ConversationsChanged);
        }
    }

    /// Drop everything. Called on logout.
    pub fn clear(&mut self) {
        self.active = None;
        self.messages.clear();
        self.ids.clear();
        self.conversations.clear();
        self.peers.clear();
        self.emit(StoreEvent::MessagesChanged);
        self.emit(StoreEvent::ConversationsChanged);
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
