//! Tests for KvStore
//!
//! These tests verify:
//! - Basic get/upsert/delete/list operations
//! - Idempotent upserts
//! - Open/close lifecycle
//! - Serialized access from many threads

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use hivekv::store::KvStore;
use hivekv::HiveError;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_store() -> KvStore {
    KvStore::open_new("test").unwrap()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_upsert_get_delete_scenario() {
    let store = open_store();

    store.upsert(b"a", b"1").unwrap();
    assert_eq!(&store.get(b"a").unwrap()[..], b"1");

    store.delete(b"a").unwrap();
    assert!(matches!(store.get(b"a"), Err(HiveError::KeyNotFound)));
}

#[test]
fn test_get_missing_key() {
    let store = open_store();
    assert!(matches!(store.get(b"missing"), Err(HiveError::KeyNotFound)));
}

#[test]
fn test_upsert_overwrites() {
    let store = open_store();
    store.upsert(b"k", b"old").unwrap();
    store.upsert(b"k", b"new").unwrap();
    assert_eq!(&store.get(b"k").unwrap()[..], b"new");
}

#[test]
fn test_upsert_same_value_is_idempotent() {
    let store = open_store();
    assert!(store.upsert(b"k", b"v").unwrap());
    assert!(!store.upsert(b"k", b"v").unwrap());
    assert_eq!(&store.get(b"k").unwrap()[..], b"v");
    assert_eq!(store.list_keys().unwrap().len(), 1);
}

#[test]
fn test_delete_missing_key_succeeds() {
    let store = open_store();
    assert!(store.delete(b"never-there").is_ok());
}

#[test]
fn test_list_keys_snapshot() {
    let store = open_store();
    assert!(store.list_keys().unwrap().is_empty());

    for key in [&b"x"[..], b"y", b"z"] {
        store.upsert(key, b"v").unwrap();
    }
    store.delete(b"y").unwrap();

    let keys: HashSet<Vec<u8>> = store
        .list_keys()
        .unwrap()
        .into_iter()
        .map(|k| k.to_vec())
        .collect();
    let expected: HashSet<Vec<u8>> = [b"x".to_vec(), b"z".to_vec()].into_iter().collect();
    assert_eq!(keys, expected);
}

#[test]
fn test_binary_keys_and_values() {
    let store = open_store();
    let key = [0x00u8, 0xFF, 0x10];
    let value: Vec<u8> = (0..=255).collect();
    store.upsert(&key, &value).unwrap();
    assert_eq!(&store.get(&key).unwrap()[..], &value[..]);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_twice_keeps_data() {
    let store = open_store();
    store.upsert(b"k", b"v").unwrap();
    store.open().unwrap();
    assert_eq!(&store.get(b"k").unwrap()[..], b"v");
}

#[test]
fn test_requests_after_close_fail() {
    let store = open_store();
    store.close();
    assert!(matches!(store.upsert(b"k", b"v"), Err(HiveError::StoreClosed)));
    assert!(matches!(store.list_keys(), Err(HiveError::StoreClosed)));

    // Closing twice is harmless
    store.close();
}

#[test]
fn test_reopen_starts_empty() {
    let store = open_store();
    store.upsert(b"k", b"v").unwrap();
    store.close();
    store.open().unwrap();
    assert!(store.list_keys().unwrap().is_empty());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers() {
    let store = Arc::new(open_store());
    let mut handles = Vec::new();

    for t in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let key = format!("t{}-k{}", t, i);
                store.upsert(key.as_bytes(), b"v").unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.list_keys().unwrap().len(), 800);
}

#[test]
fn test_concurrent_readers_see_written_value() {
    let store = Arc::new(open_store());
    store.upsert(b"shared", b"value").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(&store.get(b"shared").unwrap()[..], b"value");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
