// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciles request/response snapshots with pushed deltas.
//!
//! API calls run as background tasks; their completions are applied to the
//! store on the session task, one at a time. A snapshot fetch is tagged with
//! the open generation it was issued under. When it lands after the user
//! moved to another conversation, it is discarded.
//!
//! Summary refreshes are full re-fetches. A refresh requested while one is
//! in flight is folded into a single follow-up.

use std::mem;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::{self, JoinSet};
use tracing::{debug, info, warn};

use courier_core::{ConversationRecord, ConversationSummary, UserId, WireMessage};

use crate::api::{ApiError, ApiResult, MessagingApi};
use crate::error::{Error, Result};
use crate::session::Notice;
use crate::store::MessageStore;

type Reply<T> = oneshot::Sender<Result<T>>;

/// A finished API call, waiting to be applied.
#[derive(Debug)]
pub enum Completion {
    Snapshot {
        peer: UserId,
        generation: u64,
        result: ApiResult<Vec<WireMessage>>,
        reply: Option<Reply<()>>,
    },
    Conversations {
        result: ApiResult<Vec<ConversationRecord>>,
    },
    MarkRead {
        peer: UserId,
        result: ApiResult<()>,
        reply: Option<Reply<()>>,
    },
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    again: bool,
    task: Option<task::Id>,
    waiting: Vec<Reply<Vec<ConversationSummary>>>,
    queued: Vec<Reply<Vec<ConversationSummary>>>,
}

pub struct ConversationSynchronizer {
    api: Arc<dyn MessagingApi>,
    page_size: u32,
    generation: u64,
    pending: JoinSet<Completion>,
    refresh: RefreshState,
}

impl ConversationSynchronizer {
    pub fn new(api: Arc<dyn MessagingApi>, page_size: u32) -> Self {
        ConversationSynchronizer {
            api,
            page_size,
            generation: 0,
            pending: JoinSet::new(),
            refresh: RefreshState::default(),
        }
    }

    /// Make `peer` the active conversation and fetch its snapshot.
    ///
    /// Any snapshot still in flight for an earlier open becomes stale.
    pub fn open(&mut self, store: &mut MessageStore, peer: UserId, reply: Option<Reply<()>>) {
        store.open(peer.clone());
        self.generation += 1;
        self.fetch_snapshot(peer, reply);
    }

    /// Leave the active conversation.
    pub fn close(&mut self, store: &mut MessageStore) {
        store.close();
        self.generation += 1;
    }

    /// Catch up after the push channel was down: re-fetch the active
    /// snapshot and the summaries.
    pub fn resync(&mut self, store: &MessageStore) {
        if let Some(peer) = store.active() {
            info!(peer = %peer, "resyncing active conversation");
            self.fetch_snapshot(peer.clone(), None);
        }
        self.refresh(None);
    }

    fn fetch_snapshot(&mut self, peer: UserId, reply: Option<Reply<()>>) {
        let api = Arc::clone(&self.api);
        let generation = self.generation;
        let page_size = self.page_size;
        self.pending.spawn(async move {
            let result = api.conversation(&peer, 1, page_size).await;
            Completion::Snapshot {
                peer,
                generation,
                result,
                reply,
            }
        });
    }

    /// Request a full re-fetch of the conversation summaries.
    pub fn refresh(&mut self, reply: Option<Reply<Vec<ConversationSummary>>>) {
        if self.refresh.in_flight {
            self.refresh.again = true;
            self.refresh.queued.extend(reply);
            return;
        }
        self.refresh.in_flight = true;
        self.refresh.waiting.extend(reply);
        self.spawn_refresh();
    }

    fn spawn_refresh(&mut self) {
        let api = Arc::clone(&self.api);
        let handle = self.pending.spawn(async move {
            let result = api.conversations().await;
            Completion::Conversations { result }
        });
        self.refresh.task = Some(handle.id());
    }

    /// Tell the server the local user read `peer`'s messages.
    pub fn mark_read(&mut self, peer: UserId, reply: Option<Reply<()>>) {
        let api = Arc::clone(&self.api);
        self.pending.spawn(async move {
            let result = api.mark_read(&peer).await;
            Completion::MarkRead {
                peer,
                result,
                reply,
            }
        });
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Wait for the next finished call. Returns `None` when nothing is
    /// pending.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        loop {
            match self.pending.join_next().await? {
                Ok(completion) => return Some(completion),
                // A lost refresh still has to release its waiters
                Err(e) if self.refresh.task == Some(e.id()) => {
                    warn!(error = %e, "refresh task did not complete");
                    return Some(Completion::Conversations {
                        result: Err(ApiError::Request(format!("refresh did not complete: {e}"))),
                    });
                }
                Err(e) => warn!(error = %e, "sync task did not complete"),
            }
        }
    }

    /// Apply a finished call to the store.
    pub fn apply(&mut self, store: &mut MessageStore, completion: Completion) -> Vec<Notice> {
        let mut notices = Vec::new();
        match completion {
            Completion::Snapshot {
                peer,
                generation,
                result,
                reply,
            } => {
                let outcome = match result {
                    _ if generation != self.generation || store.active() != Some(&peer) => {
                        debug!(peer = %peer, generation, "discarding stale snapshot");
                        Ok(())
                    }
                    Ok(snapshot) => {
                        debug!(peer = %peer, count = snapshot.len(), "applying snapshot");
                        store.replace(&peer, snapshot);
                        Ok(())
                    }
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "snapshot fetch failed");
                        notices.push(Notice::FetchFailed(e.clone()));
                        Err(Error::Fetch(e))
                    }
                };
                respond(reply, outcome);
            }
            Completion::Conversations { result } => {
                self.refresh.task = None;
                let waiting = mem::take(&mut self.refresh.waiting);
                match result {
                    Ok(records) => {
                        let kept = store.set_conversations(records);
                        debug!(count = kept, "conversation summaries refreshed");
                        for reply in waiting {
                            let _ = reply.send(Ok(store.conversations().to_vec()));
                        }
                    }
                    Err(e) => {
                        // Previous summaries stay visible
                        warn!(error = %e, "conversation refresh failed");
                        notices.push(Notice::FetchFailed(e.clone()));
                        for reply in waiting {
                            let _ = reply.send(Err(Error::Fetch(e.clone())));
                        }
                    }
                }

                self.refresh.in_flight = false;
                if mem::take(&mut self.refresh.again) {
                    self.refresh.waiting = mem::take(&mut self.refresh.queued);
                    self.refresh.in_flight = true;
                    self.spawn_refresh();
                }
            }
            Completion::MarkRead {
                peer,
                result,
                reply,
            } => {
                let outcome = match result {
                    Ok(()) => {
                        let changed = store.mark_read_from(&peer, Utc::now());
                        store.clear_unread(&peer);
                        debug!(peer = %peer, changed, "marked conversation read");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "mark-read failed");
                        notices.push(Notice::FetchFailed(e.clone()));
                        Err(Error::Fetch(e))
                    }
                };
                respond(reply, outcome);
            }
        }
        notices
    }

    /// Drop every in-flight call. Waiting callers see the session close.
    pub fn abort(&mut self) {
        self.pending.abort_all();
        self.refresh = RefreshState::default();
        self.generation += 1;
    }
}

fn respond<T>(reply: Option<Reply<T>>, outcome: Result<T>) {
    if let Some(reply) = reply {
        // The caller may have stopped waiting
        let _ = reply.send(outcome);
    }
}

#[cfg(test)]
#[path = "synchronizer_tests.rs"]
mod tests;
