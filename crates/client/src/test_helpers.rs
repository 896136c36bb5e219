// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: message builders and a scriptable API.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use courier_core::{ConversationRecord, User, UserId, WireMessage};

use crate::api::{ApiError, ApiFuture, ApiResult, MessagingApi};

/// The local user in tests.
pub const ME: &str = "me";

/// A fixed timestamp `secs` seconds after the test epoch.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
}

/// A well-formed wire message.
pub fn wire(id: i64, from: &str, to: &str, content: &str, secs: i64) -> WireMessage {
    WireMessage {
        id: Some(id),
        sender_id: UserId::from(from),
        recipient_id: UserId::from(to),
        content: content.to_string(),
        sent_at: Some(ts(secs)),
        ..WireMessage::default()
    }
}

/// A conversation record for `peer`.
pub fn record(peer: &str, unread: i64) -> ConversationRecord {
    ConversationRecord {
        user: User::new(peer, peer.to_uppercase()),
        last_message: None,
        unread_count: unread,
    }
}

#[derive(Default)]
struct MockApiState {
    snapshots: HashMap<UserId, Vec<WireMessage>>,
    gates: HashMap<UserId, Arc<Notify>>,
    conversations: Vec<ConversationRecord>,
    users: Vec<User>,
    fetch_failure: Option<ApiError>,
    send_results: VecDeque<ApiResult<WireMessage>>,
    next_id: i64,
    conversation_calls: Vec<UserId>,
    conversations_calls: usize,
    conversations_panics: u32,
    sent: Vec<(UserId, String)>,
    mark_read_calls: Vec<UserId>,
    mark_read_failure: Option<ApiError>,
}

/// Scriptable in-memory [`MessagingApi`].
///
/// Sends succeed by default with ids counting up from 100, unless results
/// were queued with [`MockApi::queue_send`].
pub struct MockApi {
    state: Mutex<MockApiState>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(MockApi {
            state: Mutex::new(MockApiState {
                next_id: 100,
                ..MockApiState::default()
            }),
        })
    }

    pub fn set_snapshot(&self, peer: &str, messages: Vec<WireMessage>) {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .insert(UserId::from(peer), messages);
    }

    /// Hold snapshot fetches for `peer` until the returned notify fires.
    pub fn gate(&self, peer: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(UserId::from(peer), Arc::clone(&notify));
        notify
    }

    pub fn set_conversations(&self, records: Vec<ConversationRecord>) {
        self.state.lock().unwrap().conversations = records;
    }

    pub fn set_users(&self, users: Vec<User>) {
        self.state.lock().unwrap().users = users;
    }

    pub fn fail_fetches(&self, error: Option<ApiError>) {
        self.state.lock().unwrap().fetch_failure = error;
    }

    pub fn fail_mark_read(&self, error: Option<ApiError>) {
        self.state.lock().unwrap().mark_read_failure = error;
    }

    /// Make the next `count` summary fetches panic instead of answering.
    pub fn panic_next_conversations(&self, count: u32) {
        self.state.lock().unwrap().conversations_panics = count;
    }

    pub fn queue_send(&self, result: ApiResult<WireMessage>) {
        self.state.lock().unwrap().send_results.push_back(result);
    }

    pub fn conversation_calls(&self) -> Vec<UserId> {
        self.state.lock().unwrap().conversation_calls.clone()
    }

    pub fn conversations_calls(&self) -> usize {
        self.state.lock().unwrap().conversations_calls
    }

    pub fn sent(&self) -> Vec<(UserId, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn mark_read_calls(&self) -> Vec<UserId> {
        self.state.lock().unwrap().mark_read_calls.clone()
    }
}

impl MessagingApi for MockApi {
    fn conversation<'a>(
        &'a self,
        peer: &'a UserId,
        _page: u32,
        _page_size: u32,
    ) -> ApiFuture<'a, Vec<WireMessage>> {
        Box::pin(async move {
            let gate = {
                let mut state = self.state.lock().unwrap();
                state.conversation_calls.push(peer.clone());
                state.gates.get(peer).cloned()
            };
            if let Some(gate) = gate {
                gate.notified().await;
            }

            let state = self.state.lock().unwrap();
            if let Some(err) = &state.fetch_failure {
                return Err(err.clone());
            }
            Ok(state.snapshots.get(peer).cloned().unwrap_or_default())
        })
    }

    fn conversations(&self) -> ApiFuture<'_, Vec<ConversationRecord>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.conversations_calls += 1;
            if state.conversations_panics > 0 {
                state.conversations_panics -= 1;
                drop(state);
                panic!("summary fetch crashed");
            }
            if let Some(err) = &state.fetch_failure {
                return Err(err.clone());
            }
            Ok(state.conversations.clone())
        })
    }

    fn search_users<'a>(&'a self, query: &'a str) -> ApiFuture<'a, Vec<User>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            if let Some(err) = &state.fetch_failure {
                return Err(err.clone());
            }
            let needle = query.to_lowercase();
            Ok(state
                .users
                .iter()
                .filter(|u| u.display_name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        })
    }

    fn send_message<'a>(
        &'a self,
        recipient: &'a UserId,
        content: &'a str,
    ) -> ApiFuture<'a, WireMessage> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.sent.push((recipient.clone(), content.to_string()));
            if let Some(result) = state.send_results.pop_front() {
                return result;
            }
            let id = state.next_id;
            state.next_id += 1;
            Ok(wire(id, ME, recipient.as_str(), content, id))
        })
    }

    fn mark_read<'a>(&'a self, peer: &'a UserId) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.mark_read_calls.push(peer.clone());
            match &state.mark_read_failure {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        })
    }
}
