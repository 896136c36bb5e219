// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::api::ApiError;
use crate::channel::ConnectionState;
use crate::transport::TransportError;

/// All possible errors surfaced by the courier sync core.
///
/// `Fetch`, `Send` and `ChannelUnavailable` are recoverable: the session keeps
/// its prior state and the caller decides whether to retry. `Authentication`
/// blocks reconnects until a fresh credential is supplied. `Validation` is a
/// caller error and is never retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}\n  hint: log in again to obtain a fresh credential")]
    Authentication(String),

    #[error("messaging hub unavailable (connection is {0})")]
    ChannelUnavailable(ConnectionState),

    #[error("fetch failed: {0}")]
    Fetch(#[source] ApiError),

    #[error("send failed: {source}")]
    Send {
        /// The unsent draft, handed back so it can be restored.
        content: String,
        #[source]
        source: ApiError,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session is closed")]
    SessionClosed,
}

impl Error {
    /// Returns true if the session survives this error with its prior state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ChannelUnavailable(_) | Error::Fetch(_) | Error::Send { .. }
        )
    }

    /// Returns the draft carried by a send failure.
    pub fn unsent_content(&self) -> Option<&str> {
        match self {
            Error::Send { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// A specialized Result type for courier operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
