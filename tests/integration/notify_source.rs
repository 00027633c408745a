//! Real filesystem notifications driving the synchronizer.

use super::test_utils::{write_file, MemoryStore};
use ipfs_sync::ignore::IgnoreRules;
use ipfs_sync::sync::{SyncOptions, Synchronizer};
use ipfs_sync::watch::NotifySource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const SETTLE: Duration = Duration::from_secs(10);

/// Wait until some emitted root satisfies `pred`.
fn wait_for_root(
    events: &crossbeam_channel::Receiver<String>,
    store: &MemoryStore,
    pred: impl Fn(&std::collections::BTreeMap<String, String>) -> bool,
) -> String {
    let deadline = Instant::now() + SETTLE;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let root = events
            .recv_timeout(remaining)
            .expect("no matching root before timeout");
        if store.links(&root).is_some_and(|links| pred(&links)) {
            return root;
        }
    }
}

#[test]
fn test_created_and_removed_files_reach_the_store() {
    let dir = TempDir::new().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    write_file(&base, "a.txt", "alpha");

    let store = MemoryStore::new();
    let mut sync = Synchronizer::watch(
        base.clone(),
        SyncOptions::default(),
        store.clone(),
        Arc::new(IgnoreRules::none()),
        Box::new(NotifySource::new()),
    )
    .unwrap();
    let events = sync.events();
    let h0 = sync.hash();

    write_file(&base, "b.txt", "bravo");
    wait_for_root(&events, &store, |links| links.contains_key("b.txt"));

    std::fs::remove_file(base.join("b.txt")).unwrap();
    let root = wait_for_root(&events, &store, |links| !links.contains_key("b.txt"));
    assert_eq!(root, h0);

    sync.close().unwrap();
}

#[test]
fn test_nested_directories_are_watched() {
    let dir = TempDir::new().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    std::fs::create_dir_all(base.join("sub/deeper")).unwrap();
    write_file(&base, "sub/seed.txt", "seed");

    let store = MemoryStore::new();
    let sync = Synchronizer::watch(
        base.clone(),
        SyncOptions::default(),
        store.clone(),
        Arc::new(IgnoreRules::none()),
        Box::new(NotifySource::new()),
    )
    .unwrap();
    let events = sync.events();

    write_file(&base, "sub/deeper/leaf.txt", "leaf");
    wait_for_root(&events, &store, |links| {
        links.contains_key("sub/deeper/leaf.txt")
    });
}
