// Skip list iterator tests
// Tests for iterating over skip list entries in internal-key order.

use lsm_core::arena::Arena;
use lsm_core::iterator::StorageIterator;
use lsm_core::key::{InternalKey, InternalKeyComparator, extract_user_key};
use lsm_core::memtable::skiplist::SkipList;
use lsm_core::{LookupKey, ValueType};

fn skiplist() -> SkipList {
    SkipList::new(InternalKeyComparator::default(), Arena::new())
}

fn ikey(user_key: &[u8], seq: u64) -> Vec<u8> {
    InternalKey::new(user_key, seq, ValueType::Value).encode().to_vec()
}

// =============================================================================
// Test 1: Empty iterator
// =============================================================================
// An iterator over an empty skip list should immediately be invalid.
#[test]
fn iterator_empty_skiplist_is_invalid() {
    let sl = skiplist();
    let iter = sl.iter();
    assert!(!iter.is_valid());
}

// =============================================================================
// Test 2: Single entry iteration
// =============================================================================
#[test]
fn iterator_single_entry() {
    let mut sl = skiplist();
    sl.insert(&ikey(b"key", 1), b"value");

    let mut iter = sl.iter();
    assert!(iter.is_valid());
    assert_eq!(iter.key(), ikey(b"key", 1).as_slice());
    assert_eq!(iter.value(), b"value");

    iter.next().unwrap();
    assert!(!iter.is_valid());
}

// =============================================================================
// Test 3: Multiple entries come out sorted
// =============================================================================
#[test]
fn iterator_returns_sorted_order() {
    let mut sl = skiplist();
    sl.insert(&ikey(b"charlie", 1), b"3");
    sl.insert(&ikey(b"alpha", 2), b"1");
    sl.insert(&ikey(b"bravo", 3), b"2");

    let mut iter = sl.iter();
    let mut user_keys = Vec::new();
    while iter.is_valid() {
        user_keys.push(extract_user_key(iter.key()).to_vec());
        iter.next().unwrap();
    }
    assert_eq!(user_keys, vec![b"alpha".to_vec(), b"bravo".to_vec(), b"charlie".to_vec()]);
}

// =============================================================================
// Test 4: Seek lands on the first entry >= target
// =============================================================================
#[test]
fn iterator_seek() {
    let mut sl = skiplist();
    for (k, seq) in [(b"a", 1), (b"c", 2), (b"e", 3)] {
        sl.insert(&ikey(k, seq), k);
    }

    let mut iter = sl.iter();
    iter.seek(LookupKey::new(b"b", 100).internal_key()).unwrap();
    assert!(iter.is_valid());
    assert_eq!(iter.value(), b"c");

    iter.seek(&ikey(b"e", 3)).unwrap();
    assert_eq!(iter.value(), b"e");

    iter.seek(&ikey(b"f", 1)).unwrap();
    assert!(!iter.is_valid());

    iter.seek_to_first().unwrap();
    assert_eq!(iter.value(), b"a");
}

// =============================================================================
// Test 5: Newest version first within a user key
// =============================================================================
#[test]
fn iterator_versions_newest_first() {
    let mut sl = skiplist();
    for seq in [5u64, 1, 9, 3] {
        sl.insert(&ikey(b"k", seq), format!("v{seq}").as_bytes());
    }

    let mut iter = sl.iter();
    let mut values = Vec::new();
    while iter.is_valid() {
        values.push(String::from_utf8(iter.value().to_vec()).unwrap());
        iter.next().unwrap();
    }
    assert_eq!(values, vec!["v9", "v5", "v3", "v1"]);
}

// =============================================================================
// Test 6: Next on an exhausted iterator is a no-op
// =============================================================================
#[test]
fn next_after_end_stays_invalid() {
    let mut sl = skiplist();
    sl.insert(&ikey(b"only", 1), b"x");
    let mut iter = sl.iter();
    iter.next().unwrap();
    iter.next().unwrap();
    assert!(!iter.is_valid());
}
