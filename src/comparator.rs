//! Byte-string ordering used for user keys.
//!
//! A [`Comparator`] provides a total order plus two helpers the table
//! builder uses to shrink index keys. Implementations must be pure: the
//! same inputs always give the same answer, from any thread.

use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

/// Total order over byte strings.
pub trait Comparator: Send + Sync {
    /// Stable identifier persisted alongside data. Opening data with a
    /// comparator of a different name must be refused by the caller.
    fn name(&self) -> &'static str;

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// If `start < limit`, rewrite `start` into a short string in
    /// `[start, limit)`. Leaving it unchanged is always correct.
    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]);

    /// Rewrite `key` into a short string `>= key`. Leaving it unchanged is
    /// always correct.
    fn find_short_successor(&self, key: &mut Vec<u8>);
}

/// Unsigned lexicographic byte order. The default user comparator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn name(&self) -> &'static str {
        "leveldb.BytewiseComparator"
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    /// ```text
    /// start = h e l l o w o r l d
    /// limit = h e l l o z e b r a
    ///                   ^ first difference: 'w' + 1 = 'x' < 'z'
    /// start'= h e l l o x
    /// ```
    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]) {
        let min_length = start.len().min(limit.len());
        let diff_index = start
            .iter()
            .zip(limit)
            .take_while(|(a, b)| a == b)
            .count();

        if diff_index >= min_length {
            // One is a prefix of the other; shortening would break order.
            return;
        }

        let diff_byte = start[diff_index];
        if diff_byte < 0xFF && diff_byte + 1 < limit[diff_index] {
            start[diff_index] += 1;
            start.truncate(diff_index + 1);
            debug_assert_eq!(self.compare(start, limit), Ordering::Less);
        }
    }

    fn find_short_successor(&self, key: &mut Vec<u8>) {
        if let Some(i) = key.iter().position(|&b| b != 0xFF) {
            key[i] += 1;
            key.truncate(i + 1);
        }
        // A run of 0xFF bytes has no shorter successor.
    }
}

/// Process-wide shared bytewise comparator.
pub fn bytewise_comparator() -> Arc<dyn Comparator> {
    static INSTANCE: OnceLock<Arc<dyn Comparator>> = OnceLock::new();
    Arc::clone(INSTANCE.get_or_init(|| Arc::new(BytewiseComparator)))
}
