// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for courier-core operations.

use thiserror::Error;

/// All possible errors that can occur in courier-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("malformed conversation: {0}")]
    MalformedConversation(String),

    #[error("invalid user id: '{0}'\n  hint: user ids must be non-empty")]
    InvalidUserId(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for courier-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
