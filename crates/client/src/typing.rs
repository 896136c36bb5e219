// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typing indicators.
//!
//! Inbound, [`TypingTracker`] keeps one idle/typing state machine per peer.
//! A repeated start while typing only restarts the inactivity timer; the
//! peer returns to idle on an explicit stop or when the timer elapses,
//! whichever comes first.
//!
//! Outbound, [`TypingDebouncer`] turns keystrokes into hub invocations: a
//! start only on a genuine idle to typing transition, and a stop on send or
//! after a quiet period without keystrokes.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use courier_core::{ClientMessage, UserId};

use crate::timer::Timer;

/// Peers currently typing toward the local user.
#[derive(Debug)]
pub struct TypingTracker {
    timeout: Duration,
    peers: BTreeMap<UserId, Timer>,
}

impl TypingTracker {
    pub fn new(timeout: Duration) -> Self {
        TypingTracker {
            timeout,
            peers: BTreeMap::new(),
        }
    }

    /// Apply a typing-started signal.
    ///
    /// Returns true if the peer went from idle to typing.
    pub fn started(&mut self, peer: UserId, now: Instant) -> bool {
        if let Some(timer) = self.peers.get_mut(&peer) {
            timer.arm(now);
            return false;
        }
        debug!(peer = %peer, "peer started typing");
        let mut timer = Timer::new(self.timeout);
        timer.arm(now);
        self.peers.insert(peer, timer);
        true
    }

    /// Apply a typing-stopped signal. Returns true if the peer was typing.
    pub fn stopped(&mut self, peer: &UserId) -> bool {
        self.peers.remove(peer).is_some()
    }

    /// Drop every peer whose inactivity timer has elapsed.
    pub fn expire(&mut self, now: Instant) -> Vec<UserId> {
        let expired: Vec<UserId> = self
            .peers
            .iter()
            .filter(|(_, timer)| timer.has_elapsed(now))
            .map(|(peer, _)| peer.clone())
            .collect();
        for peer in &expired {
            debug!(peer = %peer, "typing indicator expired");
            self.peers.remove(peer);
        }
        expired
    }

    /// Earliest pending expiry.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.peers.values().filter_map(Timer::deadline).min()
    }

    pub fn is_typing(&self, peer: &UserId) -> bool {
        self.peers.contains_key(peer)
    }

    /// Typing peers in id order.
    pub fn typing(&self) -> Vec<UserId> {
        self.peers.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}

/// Debounces the local user's typing toward a single peer at a time.
#[derive(Debug)]
pub struct TypingDebouncer {
    quiet: Timer,
    target: Option<UserId>,
}

impl TypingDebouncer {
    pub fn new(quiet: Duration) -> Self {
        TypingDebouncer {
            quiet: Timer::new(quiet),
            target: None,
        }
    }

    /// Peer the local user is currently typing toward.
    pub fn target(&self) -> Option<&UserId> {
        self.target.as_ref()
    }

    /// Register a keystroke toward `peer`.
    ///
    /// Returns the invocations to send: nothing while already typing toward
    /// `peer`, otherwise a start, preceded by a stop for the previous peer.
    pub fn keystroke(&mut self, peer: UserId, now: Instant) -> Vec<ClientMessage> {
        self.quiet.arm(now);
        if self.target.as_ref() == Some(&peer) {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(2);
        if let Some(previous) = self.target.take() {
            out.push(ClientMessage::stop_typing(previous));
        }
        self.target = Some(peer.clone());
        out.push(ClientMessage::start_typing(peer));
        out
    }

    /// The local user sent a message to `peer`.
    pub fn sent(&mut self, peer: &UserId) -> Option<ClientMessage> {
        if self.target.as_ref() != Some(peer) {
            return None;
        }
        self.stop()
    }

    /// Stop typing once the quiet period has passed without keystrokes.
    pub fn expire(&mut self, now: Instant) -> Option<ClientMessage> {
        if !self.quiet.fire(now) {
            return None;
        }
        self.stop()
    }

    /// Stop typing toward the current target, if any.
    pub fn stop(&mut self) -> Option<ClientMessage> {
        self.quiet.cancel();
        self.target.take().map(ClientMessage::stop_typing)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.quiet.deadline()
    }
}

#[cfg(test)]
#[path = "typing_tests.rs"]
mod tests;
