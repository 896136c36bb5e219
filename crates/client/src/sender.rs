// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound sends over the request/response path.
//!
//! Nothing is added to the store before the server confirms. The confirmed
//! message may reach the store twice, once as the send response and once as
//! the hub's send-confirmed echo; whichever lands first takes the position
//! and the other merges as a no-op.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use courier_core::{Message, UserId, WireMessage};

use crate::api::{ApiError, ApiResult, MessagingApi};
use crate::error::{Error, Result};
use crate::store::MessageStore;

/// A finished send call.
#[derive(Debug)]
pub struct SendOutcome {
    recipient: UserId,
    content: String,
    result: ApiResult<WireMessage>,
    reply: Option<oneshot::Sender<Result<Message>>>,
}

pub struct SendCoordinator {
    api: Arc<dyn MessagingApi>,
    pending: JoinSet<SendOutcome>,
}

impl SendCoordinator {
    pub fn new(api: Arc<dyn MessagingApi>) -> Self {
        SendCoordinator {
            api,
            pending: JoinSet::new(),
        }
    }

    /// Reject sends that can never succeed.
    pub fn validate(recipient: &UserId, content: &str) -> Result<()> {
        if recipient.is_empty() {
            return Err(Error::Validation("recipient is empty".to_string()));
        }
        if content.trim().is_empty() {
            return Err(Error::Validation("message content is empty".to_string()));
        }
        Ok(())
    }

    /// Start sending `content` to `recipient`.
    ///
    /// Invalid input is answered immediately and never reaches the API.
    pub fn send(
        &mut self,
        recipient: UserId,
        content: String,
        reply: Option<oneshot::Sender<Result<Message>>>,
    ) {
        if let Err(e) = Self::validate(&recipient, &content) {
            if let Some(reply) = reply {
                let _ = reply.send(Err(e));
            }
            return;
        }

        let api = Arc::clone(&self.api);
        self.pending.spawn(async move {
            let result = api.send_message(&recipient, &content).await;
            SendOutcome {
                recipient,
                content,
                result,
                reply,
            }
        });
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Wait for the next finished send. Returns `None` when nothing is
    /// pending.
    pub async fn next_outcome(&mut self) -> Option<SendOutcome> {
        loop {
            match self.pending.join_next().await? {
                Ok(outcome) => return Some(outcome),
                Err(e) => warn!(error = %e, "send task did not complete"),
            }
        }
    }

    /// Apply a finished send. Returns true if the server confirmed it.
    ///
    /// On failure the store is left as it was and the content goes back to
    /// the caller inside [`Error::Send`].
    pub fn apply(&mut self, store: &mut MessageStore, outcome: SendOutcome) -> bool {
        let SendOutcome {
            recipient,
            content,
            result,
            reply,
        } = outcome;

        let confirmed = result.and_then(|wire| {
            Message::try_from(wire.clone())
                .map(|msg| (wire, msg))
                .map_err(|e| ApiError::Decode(e.to_string()))
        });

        let (outcome, ok) = match confirmed {
            Ok((wire, msg)) => {
                let added = store.append(wire);
                debug!(id = msg.id, recipient = %recipient, added, "send confirmed");
                (Ok(msg), true)
            }
            Err(source) => {
                warn!(recipient = %recipient, error = %source, "send failed");
                (Err(Error::Send { content, source }), false)
            }
        };

        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
        ok
    }

    /// Drop every in-flight send.
    pub fn abort(&mut self) {
        self.pending.abort_all();
    }
}

#[cfg(test)]
#[path = "sender_tests.rs"]
mod tests;
