// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! courier-core: Shared types for the courier messaging client
//!
//! This crate provides the domain model (users, messages, conversation
//! summaries) and the hub wire protocol used by the courier sync core.

pub mod conversation;
pub mod error;
pub mod message;
pub mod protocol;
pub mod user;

pub use conversation::{ConversationRecord, ConversationSummary, LastMessage};
pub use error::{Error, Result};
pub use message::{Message, MessageId, WireMessage};
pub use protocol::{ClientMessage, ServerMessage};
pub use user::{PeerDirectory, User, UserId};
