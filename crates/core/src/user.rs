// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Users and the per-session peer directory.
//!
//! A [`User`] is immutable for the lifetime of a session view. The
//! [`PeerDirectory`] interns each user once so conversation summaries share a
//! single `Arc<User>` instead of carrying their own copies.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque user identity as issued by the auth provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identity is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUserId(s.to_string()));
        }
        Ok(UserId(trimmed.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        User {
            id: id.into(),
            display_name: display_name.into(),
            avatar: None,
        }
    }
}

/// Session-scoped set of known peers.
///
/// The first sighting of a user wins; later records with the same id resolve
/// to the already interned value.
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: HashMap<UserId, Arc<User>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a user, returning the shared handle.
    pub fn intern(&mut self, user: User) -> Arc<User> {
        Arc::clone(
            self.peers
                .entry(user.id.clone())
                .or_insert_with(|| Arc::new(user)),
        )
    }

    pub fn get(&self, id: &UserId) -> Option<Arc<User>> {
        self.peers.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Forgets every peer. Called on logout.
    pub fn clear(&mut self) {
        self.peers.clear();
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
