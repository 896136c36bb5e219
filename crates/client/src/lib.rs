// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! courier - Real-time messaging synchronization core.
//!
//! Keeps one conversation view consistent while messages arrive over two
//! independent paths: a persistent hub connection that pushes deltas, and a
//! request/response API that returns snapshots and send confirmations.
//!
//! # Main Components
//!
//! - [`HubChannel`] - Hub connection lifecycle with bounded reconnect backoff
//! - [`MessageStore`] - Identity-keyed, timestamp-ordered message list and
//!   conversation summaries
//! - [`TypingTracker`] / [`TypingDebouncer`] - Inbound and outbound typing state
//! - [`ConversationSynchronizer`] - Snapshots, summary refreshes, read receipts
//! - [`SendCoordinator`] - Outbound sends and echo reconciliation
//! - [`Session`] - Session-scoped context tying it all together
//!
//! ```rust,ignore
//! use courier::{Config, Credentials, Session};
//!
//! let session = Session::login(&Config::default(), Credentials::new(token, "me")).await?;
//! session.open_conversation("alice").await?;
//! session.send("alice", "hello").await?;
//! session.logout().await;
//! ```

pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod sender;
pub mod session;
pub mod store;
pub mod synchronizer;
pub mod timer;
pub mod transport;
pub mod typing;

#[cfg(test)]
mod test_helpers;

pub use api::{ApiError, HttpApi, MessagingApi};
pub use channel::{ChannelEvent, ConnectionState, HubChannel, ReconnectPolicy};
pub use config::Config;
pub use error::{Error, Result};
pub use sender::SendCoordinator;
pub use session::{Credentials, Notice, Session, SessionHandle, SessionView};
pub use store::{MessageStore, StoreEvent};
pub use synchronizer::ConversationSynchronizer;
pub use transport::{Transport, TransportError, WebSocketTransport};
pub use typing::{TypingDebouncer, TypingTracker};
