// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::test_helpers::{record, ts, wire, ME};

fn store_with(peer: &str) -> MessageStore {
    let mut store = MessageStore::new(UserId::from(ME));
    store.open(UserId::from(peer));
    store
}

fn contents(store: &MessageStore) -> Vec<&str> {
    store.messages().iter().map(|m| m.content.as_str()).collect()
}

fn ids(store: &MessageStore) -> Vec<MessageId> {
    store.messages().iter().map(|m| m.id).collect()
}

#[test]
fn merge_is_idempotent() {
    let mut store = store_with("alice");
    let batch = vec![
        wire(1, "alice", ME, "hi", 10),
        wire(2, ME, "alice", "hey", 20),
    ];

    assert_eq!(store.merge(batch.clone()), 2);
    let first = store.messages().to_vec();
    assert_eq!(store.merge(batch), 0);
    assert_eq!(store.messages(), first.as_slice());
}

#[test]
fn merge_orders_by_sent_timestamp() {
    let mut store = store_with("alice");
    store.merge(vec![
        wire(3, "alice", ME, "third", 30),
        wire(1, "alice", ME, "first", 10),
        wire(2, ME, "alice", "second", 20),
    ]);

    assert_eq!(contents(&store), vec!["first", "second", "third"]);
}

#[test]
fn out_of_order_push_lands_in_timestamp_order() {
    let mut store = store_with("alice");
    assert!(store.append(wire(2, "alice", ME, "there", 20)));
    assert!(store.append(wire(1, "alice", ME, "hi", 10)));

    assert_eq!(contents(&store), vec!["hi", "there"]);
    assert_eq!(store.unread_from(&UserId::from("alice")), 2);
}

#[test]
fn equal_timestamps_keep_arrival_order() {
    let mut store = store_with("alice");
    store.append(wire(9, "alice", ME, "a", 10));
    store.append(wire(4, ME, "alice", "b", 10));
    store.append(wire(7, "alice", ME, "c", 10));

    assert_eq!(ids(&store), vec![9, 4, 7]);
}

#[test]
fn duplicate_keeps_first_position() {
    let mut store = store_with("alice");
    store.append(wire(1, "alice", ME, "original", 10));
    store.append(wire(2, "alice", ME, "later", 20));
    assert!(!store.append(wire(1, "alice", ME, "changed", 30)));

    assert_eq!(contents(&store), vec!["original", "later"]);
}

#[test]
fn duplicates_within_one_batch_collapse() {
    let mut store = store_with("alice");
    let added = store.merge(vec![
        wire(5, "alice", ME, "x", 10),
        wire(5, "alice", ME, "x", 10),
    ]);

    assert_eq!(added, 1);
    assert_eq!(ids(&store), vec![5]);
}

#[test]
fn malformed_entries_are_reported_and_skipped() {
    let mut store = store_with("alice");
    let mut events = store.subscribe();
    let mut no_id = wire(0, "alice", ME, "no id", 10);
    no_id.id = None;
    let mut no_time = wire(3, "alice", ME, "no time", 10);
    no_time.sent_at = None;

    let added = store.merge(vec![no_id, wire(2, "alice", ME, "ok", 20), no_time]);

    assert_eq!(added, 1);
    assert_eq!(contents(&store), vec!["ok"]);
    let mut rejected = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, StoreEvent::Rejected(_)) {
            rejected += 1;
        }
    }
    assert_eq!(rejected, 2);
}

#[test]
fn entries_outside_active_conversation_are_ignored() {
    let mut store = store_with("alice");
    assert!(!store.append(wire(1, "bob", ME, "wrong room", 10)));
    assert!(!store.append(wire(2, "alice", "bob", "not mine", 10)));
    assert!(store.messages().is_empty());
}

#[test]
fn merge_without_active_conversation_is_noop() {
    let mut store = MessageStore::new(UserId::from(ME));
    assert_eq!(store.merge(vec![wire(1, "alice", ME, "hi", 10)]), 0);
}

#[test]
fn replace_keeps_local_entries_newer_than_snapshot() {
    let mut store = store_with("alice");
    store.merge(vec![
        wire(1, "alice", ME, "old", 10),
        wire(9, "alice", ME, "raced", 50),
    ]);

    let replaced = store.replace(
        &UserId::from("alice"),
        vec![
            wire(1, "alice", ME, "old", 10),
            wire(2, ME, "alice", "reply", 20),
        ],
    );

    assert!(replaced);
    assert_eq!(ids(&store), vec![1, 2, 9]);
}

#[test]
fn replace_drops_local_entries_older_than_snapshot() {
    let mut store = store_with("alice");
    store.append(wire(7, "alice", ME, "stale", 15));

    store.replace(
        &UserId::from("alice"),
        vec![wire(1, "alice", ME, "a", 10), wire(2, "alice", ME, "b", 20)],
    );

    assert_eq!(ids(&store), vec![1, 2]);
}

#[test]
fn replace_with_empty_snapshot_keeps_local_entries() {
    let mut store = store_with("alice");
    store.append(wire(1, "alice", ME, "pushed", 10));

    assert!(store.replace(&UserId::from("alice"), Vec::new()));
    assert_eq!(ids(&store), vec![1]);
}

#[test]
fn replace_for_inactive_conversation_is_rejected() {
    let mut store = store_with("alice");
    store.append(wire(1, "alice", ME, "hi", 10));

    assert!(!store.replace(&UserId::from("bob"), vec![wire(2, "bob", ME, "yo", 5)]));
    assert_eq!(ids(&store), vec![1]);
}

#[test]
fn open_same_peer_keeps_messages() {
    let mut store = store_with("alice");
    store.append(wire(1, "alice", ME, "hi", 10));
    store.open(UserId::from("alice"));
    assert_eq!(ids(&store), vec![1]);
}

#[test]
fn open_other_peer_clears_messages() {
    let mut store = store_with("alice");
    store.append(wire(1, "alice", ME, "hi", 10));
    store.open(UserId::from("bob"));

    assert!(store.messages().is_empty());
    assert_eq!(store.active(), Some(&UserId::from("bob")));
    // The id index is reset with the list
    assert!(store.append(wire(1, "bob", ME, "reused id", 10)));
}

#[test]
fn close_clears_active_conversation() {
    let mut store = store_with("alice");
    store.append(wire(1, "alice", ME, "hi", 10));
    store.close();

    assert!(store.active().is_none());
    assert!(store.messages().is_empty());
}

#[test]
fn mark_read_from_only_touches_inbound() {
    let mut store = store_with("alice");
    store.merge(vec![
        wire(1, "alice", ME, "in", 10),
        wire(2, ME, "alice", "out", 20),
        wire(3, "alice", ME, "in again", 30),
    ]);

    let changed = store.mark_read_from(&UserId::from("alice"), ts(40));

    assert_eq!(changed, 2);
    assert_eq!(store.unread_from(&UserId::from("alice")), 0);
    assert!(!store.get(2).unwrap().is_read);
    assert_eq!(store.get(1).unwrap().read_at, Some(ts(40)));
    assert_eq!(store.mark_read_from(&UserId::from("alice"), ts(50)), 0);
}

#[test]
fn mark_read_by_touches_outbound() {
    let mut store = store_with("alice");
    store.merge(vec![
        wire(1, "alice", ME, "in", 10),
        wire(2, ME, "alice", "out", 20),
    ]);

    assert_eq!(store.mark_read_by(&UserId::from("alice"), ts(30)), 1);
    assert!(store.get(2).unwrap().is_read);
    assert!(!store.get(1).unwrap().is_read);
}

#[test]
fn set_conversations_drops_malformed_records() {
    let mut store = MessageStore::new(UserId::from(ME));
    let broken = record("", 0);

    let kept = store.set_conversations(vec![record("alice", 2), broken, record("bob", -1)]);

    assert_eq!(kept, 2);
    let bob = store.conversation(&UserId::from("bob")).unwrap();
    assert_eq!(bob.unread_count, 0);
    assert_eq!(store.peers().len(), 2);
}

#[test]
fn clear_unread_zeroes_count() {
    let mut store = MessageStore::new(UserId::from(ME));
    store.set_conversations(vec![record("alice", 3)]);
    let mut events = store.subscribe();

    store.clear_unread(&UserId::from("alice"));
    store.clear_unread(&UserId::from("alice"));

    assert_eq!(
        store
            .conversation(&UserId::from("alice"))
            .unwrap()
            .unread_count,
        0
    );
    assert_eq!(events.try_recv().ok(), Some(StoreEvent::ConversationsChanged));
    assert!(events.try_recv().is_err());
}

#[test]
fn clear_drops_everything() {
    let mut store = store_with("alice");
    store.append(wire(1, "alice", ME, "hi", 10));
    store.set_conversations(vec![record("alice", 1)]);

    store.clear();

    assert!(store.active().is_none());
    assert!(store.messages().is_empty());
    assert!(store.conversations().is_empty());
    assert!(store.peers().is_empty());
}
