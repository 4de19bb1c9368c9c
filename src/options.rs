use std::fmt;
use std::sync::Arc;

use crate::arena::BLOCK_SIZE;
use crate::bloom::{BloomFilterPolicy, FilterPolicy, InternalFilterPolicy};
use crate::comparator::{Comparator, bytewise_comparator};
use crate::error::{Error, Result};

/// Default memtable flush threshold (4MB).
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Tunables for the key format and memtable layers.
#[derive(Clone)]
pub struct Options {
    /// Orders user keys. Its name is persisted; reopening data with a
    /// differently named comparator must fail.
    pub comparator: Arc<dyn Comparator>,
    /// Size of a standard arena block.
    pub arena_block_size: usize,
    /// Memtable size at which it should be frozen and flushed.
    pub write_buffer_size: usize,
    /// Bloom filter density. `None` disables filters.
    pub bloom_bits_per_key: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            comparator: bytewise_comparator(),
            arena_block_size: BLOCK_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            bloom_bits_per_key: Some(10),
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        if self.arena_block_size == 0 {
            return Err(Error::InvalidArgument("arena_block_size must be > 0".into()));
        }
        if self.write_buffer_size == 0 {
            return Err(Error::InvalidArgument("write_buffer_size must be > 0".into()));
        }
        if self.bloom_bits_per_key == Some(0) {
            return Err(Error::InvalidArgument("bloom_bits_per_key must be > 0".into()));
        }
        Ok(())
    }

    /// Filter policy for tables keyed by internal keys, if filters are on.
    pub fn filter_policy(&self) -> Option<InternalFilterPolicy> {
        self.bloom_bits_per_key.map(|bits| {
            let user_policy: Arc<dyn FilterPolicy> = Arc::new(BloomFilterPolicy::new(bits));
            InternalFilterPolicy::new(user_policy)
        })
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("comparator", &self.comparator.name())
            .field("arena_block_size", &self.arena_block_size)
            .field("write_buffer_size", &self.write_buffer_size)
            .field("bloom_bits_per_key", &self.bloom_bits_per_key)
            .finish()
    }
}
