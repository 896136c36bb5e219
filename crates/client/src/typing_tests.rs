// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const TIMEOUT: Duration = Duration::from_secs(3);
const QUIET: Duration = Duration::from_millis(500);

fn peer(id: &str) -> UserId {
    UserId::from(id)
}

#[test]
fn first_start_is_a_transition() {
    let now = Instant::now();
    let mut tracker = TypingTracker::new(TIMEOUT);

    assert!(tracker.started(peer("alice"), now));
    assert!(!tracker.started(peer("alice"), now + Duration::from_secs(1)));
    assert!(tracker.is_typing(&peer("alice")));
}

#[test]
fn expires_exactly_at_timeout() {
    let start = Instant::now();
    let mut tracker = TypingTracker::new(TIMEOUT);
    tracker.started(peer("alice"), start);

    assert!(tracker
        .expire(start + TIMEOUT - Duration::from_millis(1))
        .is_empty());
    assert!(tracker.is_typing(&peer("alice")));
    assert_eq!(tracker.expire(start + TIMEOUT), vec![peer("alice")]);
    assert!(!tracker.is_typing(&peer("alice")));
}

#[test]
fn repeated_start_restarts_timer() {
    let start = Instant::now();
    let mut tracker = TypingTracker::new(TIMEOUT);
    tracker.started(peer("alice"), start);
    tracker.started(peer("alice"), start + Duration::from_secs(2));

    assert!(tracker.expire(start + TIMEOUT).is_empty());
    assert_eq!(
        tracker.next_deadline(),
        Some(start + Duration::from_secs(2) + TIMEOUT)
    );
    assert_eq!(
        tracker.expire(start + Duration::from_secs(5)),
        vec![peer("alice")]
    );
}

#[test]
fn explicit_stop_wins_over_timer() {
    let start = Instant::now();
    let mut tracker = TypingTracker::new(TIMEOUT);
    tracker.started(peer("alice"), start);

    assert!(tracker.stopped(&peer("alice")));
    assert!(!tracker.stopped(&peer("alice")));
    assert!(tracker.next_deadline().is_none());
    assert!(tracker.expire(start + TIMEOUT).is_empty());
}

#[test]
fn peers_expire_independently() {
    let start = Instant::now();
    let mut tracker = TypingTracker::new(TIMEOUT);
    tracker.started(peer("bob"), start);
    tracker.started(peer("alice"), start + Duration::from_secs(1));

    assert_eq!(tracker.typing(), vec![peer("alice"), peer("bob")]);
    assert_eq!(tracker.next_deadline(), Some(start + TIMEOUT));
    assert_eq!(tracker.expire(start + TIMEOUT), vec![peer("bob")]);
    assert_eq!(tracker.typing(), vec![peer("alice")]);
}

#[test]
fn keystrokes_send_a_single_start() {
    let start = Instant::now();
    let mut debouncer = TypingDebouncer::new(QUIET);

    assert_eq!(
        debouncer.keystroke(peer("alice"), start),
        vec![ClientMessage::start_typing(peer("alice"))]
    );
    for ms in [100, 200, 300] {
        let out = debouncer.keystroke(peer("alice"), start + Duration::from_millis(ms));
        assert!(out.is_empty());
    }
    assert_eq!(debouncer.target(), Some(&peer("alice")));
}

#[test]
fn quiet_period_sends_stop() {
    let start = Instant::now();
    let mut debouncer = TypingDebouncer::new(QUIET);
    debouncer.keystroke(peer("alice"), start);
    debouncer.keystroke(peer("alice"), start + Duration::from_millis(400));

    assert_eq!(debouncer.expire(start + QUIET), None);
    assert_eq!(
        debouncer.expire(start + Duration::from_millis(900)),
        Some(ClientMessage::stop_typing(peer("alice")))
    );
    assert!(debouncer.target().is_none());
    assert_eq!(debouncer.expire(start + Duration::from_secs(5)), None);
}

#[test]
fn typing_again_after_stop_sends_new_start() {
    let start = Instant::now();
    let mut debouncer = TypingDebouncer::new(QUIET);
    debouncer.keystroke(peer("alice"), start);
    debouncer.expire(start + QUIET);

    assert_eq!(
        debouncer.keystroke(peer("alice"), start + Duration::from_secs(1)),
        vec![ClientMessage::start_typing(peer("alice"))]
    );
}

#[test]
fn send_stops_typing_toward_recipient() {
    let start = Instant::now();
    let mut debouncer = TypingDebouncer::new(QUIET);
    debouncer.keystroke(peer("alice"), start);

    assert_eq!(debouncer.sent(&peer("bob")), None);
    assert_eq!(
        debouncer.sent(&peer("alice")),
        Some(ClientMessage::stop_typing(peer("alice")))
    );
    assert!(debouncer.next_deadline().is_none());
}

#[test]
fn switching_peer_stops_previous_target() {
    let start = Instant::now();
    let mut debouncer = TypingDebouncer::new(QUIET);
    debouncer.keystroke(peer("alice"), start);

    assert_eq!(
        debouncer.keystroke(peer("bob"), start + Duration::from_millis(100)),
        vec![
            ClientMessage::stop_typing(peer("alice")),
            ClientMessage::start_typing(peer("bob")),
        ]
    );
}
