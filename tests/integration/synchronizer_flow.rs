//! End-to-end behaviour of the synchronizer over the in-memory store.

use super::test_utils::{root_id, Call, Harness, ManualSource, MemoryStore, RECV_TIMEOUT};
use ipfs_sync::error::SyncError;
use ipfs_sync::ignore::IgnoreRules;
use ipfs_sync::sync::{Delivery, EventFlags, RawEvent, SyncOptions, Synchronizer};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn wait_for_hash(h: &Harness, expected: &str) {
    let deadline = Instant::now() + RECV_TIMEOUT;
    while h.sync.hash() != expected {
        assert!(Instant::now() < deadline, "hash never became {expected}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_create_then_remove_restores_initial_root() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();
    let h0 = h.sync.hash();

    h.write("b.txt", "bravo");
    h.source.send("b.txt", EventFlags::CREATE);
    let h1 = events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_ne!(h1, h0);

    let links = h.store.links(&h1).unwrap();
    assert!(links.contains_key("a.txt"));
    assert!(links.contains_key("b.txt"));

    h.remove("b.txt");
    h.source.send("b.txt", EventFlags::REMOVE);
    let h2 = events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(h2, h0);
    assert_eq!(h.sync.hash(), h0);

    let calls = h.store.calls();
    assert!(matches!(&calls[0], Call::Add(p) if p == h.dir.path()));
    assert!(matches!(&calls[1], Call::Add(p) if p.ends_with("b.txt")));
    assert!(matches!(&calls[2], Call::AddLink { root, path, .. } if *root == h0 && path == "b.txt"));
    assert!(matches!(&calls[3], Call::RemoveLink { root, path } if *root == h1 && path == "b.txt"));
}

#[test]
fn test_creates_apply_in_arrival_order() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();
    let h0 = h.sync.hash();

    let names = ["one.txt", "two.txt", "three.txt"];
    for name in names {
        h.write(name, name);
        h.source.send(name, EventFlags::CREATE);
    }

    let emitted: Vec<String> = (0..names.len())
        .map(|_| events.recv_timeout(RECV_TIMEOUT).unwrap())
        .collect();

    let mut expected = h.store.links(&h0).unwrap();
    let mut chain = Vec::new();
    for name in names {
        let hash = match h
            .store
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::AddLink { path, hash, .. } if path == name => Some(hash),
                _ => None,
            }) {
            Some(hash) => hash,
            None => panic!("no add-link for {name}"),
        };
        expected.insert(name.to_string(), hash);
        chain.push(root_id(&expected));
    }
    assert_eq!(emitted, chain);
    assert_eq!(h.sync.hash(), *chain.last().unwrap());
}

#[test]
fn test_rename_is_remove_then_create() {
    let h = Harness::start(&[("old.txt", "payload")]);
    let events = h.sync.events();
    let h0 = h.sync.hash();

    std::fs::rename(h.dir.path().join("old.txt"), h.dir.path().join("new.txt")).unwrap();
    h.source.send("old.txt", EventFlags::RENAME);
    h.source.send("new.txt", EventFlags::CREATE);

    let after_remove = events.recv_timeout(RECV_TIMEOUT).unwrap();
    let after_create = events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_ne!(after_remove, h0);
    assert_ne!(after_remove, after_create);

    let links = h.store.links(&after_remove).unwrap();
    assert!(links.is_empty());
    let links = h.store.links(&after_create).unwrap();
    assert_eq!(links.keys().collect::<Vec<_>>(), vec!["new.txt"]);
}

#[test]
fn test_failed_link_keeps_hash_and_emits_nothing() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();
    let h0 = h.sync.hash();
    h.store.fail_links_at("broken.txt");

    h.write("broken.txt", "x");
    h.source.send("broken.txt", EventFlags::CREATE);
    h.write("ok.txt", "y");
    h.source.send("ok.txt", EventFlags::CREATE);

    let next = events.recv_timeout(RECV_TIMEOUT).unwrap();
    let links = h.store.links(&next).unwrap();
    assert!(links.contains_key("ok.txt"));
    assert!(!links.contains_key("broken.txt"));
    // The failed mutation did not advance the root the next one was applied to.
    assert!(h.store.calls().iter().any(
        |c| matches!(c, Call::AddLink { root, path, .. } if *root == h0 && path == "ok.txt")
    ));
}

#[test]
fn test_remove_of_unknown_link_is_contained() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();
    let h0 = h.sync.hash();

    h.source.send("never-added.txt", EventFlags::REMOVE);
    h.source.send("a.txt", EventFlags::REMOVE);

    let next = events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(h.store.links(&next).unwrap().is_empty());
    assert_ne!(next, h0);
}

#[test]
fn test_chmod_unknown_and_watch_errors_emit_nothing() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();
    let h0 = h.sync.hash();

    h.source.send("a.txt", EventFlags::CHMOD);
    h.source.send("a.txt", EventFlags::empty());
    h.source.send_error("queue overflow");
    h.write("b.txt", "bravo");
    h.source.send("b.txt", EventFlags::CREATE);

    let next = events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(h.store.links(&next).unwrap().contains_key("b.txt"));

    // Chmod and Unknown made no store calls: initial add, then add + add-link for b.txt.
    assert_eq!(h.store.calls().len(), 3);
    assert!(matches!(&h.store.calls()[2], Call::AddLink { root, .. } if *root == h0));
}

#[test]
fn test_write_relinks_even_when_unchanged() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();

    h.source.send("a.txt", EventFlags::WRITE);
    h.write("b.txt", "bravo");
    h.source.send("b.txt", EventFlags::CREATE);

    // Rewriting identical content yields the same root, so nothing is emitted for it.
    let next = events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(h.store.links(&next).unwrap().contains_key("b.txt"));
    let add_links = h
        .store
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::AddLink { .. }))
        .count();
    assert_eq!(add_links, 2);
}

#[test]
fn test_base_directory_event_is_skipped() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();

    h.source.send_raw(RawEvent::new(h.dir.path(), EventFlags::WRITE));
    h.write("b.txt", "bravo");
    h.source.send("b.txt", EventFlags::CREATE);

    events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(h.store.calls().len(), 3);
}

#[test]
fn test_single_mutation_in_flight_under_burst() {
    let h = Harness::start(&[("seed.txt", "seed")]);
    h.store.set_delay(Duration::from_millis(2));
    let events = h.sync.events();

    let names: Vec<String> = (0..24).map(|i| format!("f{i}.txt")).collect();
    for name in &names {
        h.write(name, name);
    }
    std::thread::scope(|scope| {
        for chunk in names.chunks(6) {
            let source = h.source.clone();
            scope.spawn(move || {
                for name in chunk {
                    source.send(name, EventFlags::CREATE);
                }
            });
        }
    });

    let mut last = String::new();
    for _ in 0..names.len() {
        last = events.recv_timeout(RECV_TIMEOUT).unwrap();
    }
    assert_eq!(h.store.links(&last).unwrap().len(), names.len() + 1);
    assert_eq!(h.store.max_in_flight(), 1);
}

#[test]
fn test_block_delivery_loses_nothing() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();

    for name in ["x", "y", "z"] {
        h.write(name, name);
        h.source.send(name, EventFlags::CREATE);
    }
    std::thread::sleep(Duration::from_millis(50));

    let emitted: Vec<String> = (0..3)
        .map(|_| events.recv_timeout(RECV_TIMEOUT).unwrap())
        .collect();
    let last = h.store.links(&emitted[2]).unwrap();
    assert_eq!(last.len(), 4);
    assert_eq!(h.store.links(&emitted[0]).unwrap().len(), 2);
    assert_eq!(h.store.links(&emitted[1]).unwrap().len(), 3);
}

#[test]
fn test_drop_newest_delivery_drops_when_full() {
    let options = SyncOptions {
        events_buffer: 1,
        delivery: Delivery::DropNewest,
        ..Default::default()
    };
    let h = Harness::start_with(&[("a.txt", "alpha")], options, Arc::new(IgnoreRules::none()));
    let events = h.sync.events();

    for name in ["x", "y", "z"] {
        h.write(name, name);
        h.source.send(name, EventFlags::CREATE);
    }

    // Wait until the loop applied all three, then only the first fits the buffer.
    let deadline = Instant::now() + RECV_TIMEOUT;
    loop {
        if h.store.links(&h.sync.hash()).map(|l| l.len()) == Some(4) {
            break;
        }
        assert!(Instant::now() < deadline, "events never applied");
        std::thread::sleep(Duration::from_millis(5));
    }

    let first = events.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(h.store.links(&first).unwrap().len(), 2);
    assert!(events.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_hash_tracks_without_events_consumer() {
    let h = Harness::start(&[("a.txt", "alpha")]);
    let h0 = h.sync.hash();

    h.write("b.txt", "bravo");
    h.source.send("b.txt", EventFlags::CREATE);

    let mut expected: BTreeMap<String, String> = h.store.links(&h0).unwrap();
    let deadline = Instant::now() + RECV_TIMEOUT;
    while h.store.calls().len() < 3 {
        assert!(Instant::now() < deadline);
        std::thread::sleep(Duration::from_millis(5));
    }
    if let Call::AddLink { hash, .. } = &h.store.calls()[2] {
        expected.insert("b.txt".to_string(), hash.clone());
    }
    wait_for_hash(&h, &root_id(&expected));
}

#[test]
fn test_close_stops_processing() {
    let mut h = Harness::start(&[("a.txt", "alpha")]);
    let events = h.sync.events();
    let h0 = h.sync.hash();

    h.sync.close().unwrap();
    assert!(h.source.was_unsubscribed());
    // Second close is a no-op.
    h.sync.close().unwrap();

    h.write("b.txt", "bravo");
    h.source.send("b.txt", EventFlags::CREATE);
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(h.sync.hash(), h0);
    assert_eq!(h.store.calls().len(), 1);
    assert!(events.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn test_initial_ingestion_failure_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = MemoryStore::new();
    store.fail_adds();
    let (source, handle) = ManualSource::new(dir.path());

    let result = Synchronizer::watch(
        dir.path(),
        SyncOptions::default(),
        store,
        Arc::new(IgnoreRules::none()),
        Box::new(source),
    );

    match result {
        Err(SyncError::InitialIngestionFailed { path, .. }) => assert_eq!(path, dir.path()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("synchronizer should not start"),
    }
    assert!(handle.was_unsubscribed());
}
