pub mod skiplist;

use std::cmp::Ordering;

use tracing::{trace, warn};

use skiplist::{SkipList, SkipListIterator};

use crate::arena::{Arena, MemoryUsage};
use crate::coding::get_length_prefixed_slice;
use crate::error::Result;
use crate::key::{InternalKeyComparator, LookupKey, ParsedInternalKey, append_internal_key, parse_internal_key};
use crate::options::{DEFAULT_WRITE_BUFFER_SIZE, Options};
use crate::types::{SequenceNumber, ValueType};

/// Outcome of a memtable point lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'a> {
    /// The newest visible version is a value.
    Found(&'a [u8]),
    /// The newest visible version is a tombstone. Older tables must not be
    /// consulted.
    Deleted,
    /// No visible version here; keep looking in older tables.
    Missing,
}

/// In-memory sorted buffer for writes.
///
/// Every write goes here first, as an internal key carrying its sequence
/// number, so several versions of one user key coexist (newest first).
/// When the arena grows past the size limit the memtable is frozen and
/// flushed; it is then dropped as a whole, releasing the arena.
///
/// Deletes are tombstones: an entry with [`ValueType::Deletion`]. The key
/// can't just be removed because older versions may exist on disk.
pub struct MemTable {
    table: SkipList,
    size_limit: usize,
}

impl MemTable {
    /// Create an empty memtable ordering keys with `comparator`, using the
    /// default arena block size and the default write buffer size.
    pub fn new(comparator: InternalKeyComparator) -> Self {
        MemTable {
            table: SkipList::new(comparator, Arena::new()),
            size_limit: DEFAULT_WRITE_BUFFER_SIZE,
        }
    }

    /// Create an empty memtable configured from `options`.
    pub fn with_options(options: &Options) -> Result<Self> {
        options.validate()?;
        Ok(MemTable {
            table: SkipList::new(
                InternalKeyComparator::new(options.comparator.clone()),
                Arena::with_block_size(options.arena_block_size),
            ),
            size_limit: options.write_buffer_size,
        })
    }

    /// Record a mutation of `user_key` at `sequence`.
    pub fn add(&mut self, sequence: SequenceNumber, value_type: ValueType, user_key: &[u8], value: &[u8]) {
        let parsed = ParsedInternalKey::new(user_key, sequence, value_type);
        let mut internal_key = Vec::with_capacity(parsed.encoded_len());
        append_internal_key(&mut internal_key, &parsed);
        self.table.insert(&internal_key, value);
        trace!(key = %parsed, value_len = value.len(), "memtable add");
    }

    /// Find the newest version of the lookup key's user key with a sequence
    /// at or below the lookup sequence.
    pub fn get(&self, key: &LookupKey) -> Result<LookupResult<'_>> {
        // The memtable key is the length-prefixed internal key.
        let (internal_key, _) = get_length_prefixed_slice(key.memtable_key())?;
        debug_assert_eq!(internal_key, key.internal_key());

        let Some((entry_key, value)) = self.table.seek_entry(internal_key) else {
            return Ok(LookupResult::Missing);
        };
        let parsed = parse_internal_key(entry_key).inspect_err(|e| {
            warn!(error = %e, "memtable holds a corrupt internal key");
        })?;

        let user_comparator = self.table.comparator().user_comparator();
        if user_comparator.compare(parsed.user_key, key.user_key()) != Ordering::Equal {
            return Ok(LookupResult::Missing);
        }
        Ok(match parsed.value_type {
            ValueType::Value => LookupResult::Found(value),
            ValueType::Deletion => LookupResult::Deleted,
        })
    }

    /// Sorted iterator over all entries, tombstones included. Keys are
    /// internal keys.
    pub fn iter(&self) -> SkipListIterator<'_> {
        self.table.iter()
    }

    /// Bytes held by the arena, which backs every skip list node and entry.
    pub fn approximate_memory_usage(&self) -> usize {
        self.table.memory_usage()
    }

    /// Handle for reading the memory usage from another thread.
    pub fn usage_tracker(&self) -> MemoryUsage {
        self.table.usage_tracker()
    }

    /// Check if memtable has reached the flush threshold.
    pub fn is_full(&self) -> bool {
        self.approximate_memory_usage() >= self.size_limit
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn comparator(&self) -> &InternalKeyComparator {
        self.table.comparator()
    }
}
