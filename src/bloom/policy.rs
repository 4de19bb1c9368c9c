use std::sync::Arc;

use crate::bloom::BloomFilter;
use crate::key::extract_user_key;

/// Builds and queries the per-table key filters.
pub trait FilterPolicy: Send + Sync {
    /// Persisted with each filter block; a table whose filter was built by
    /// a differently named policy must not consult it.
    fn name(&self) -> &'static str;

    /// Append a filter summarizing `keys` to `dst`.
    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>);

    /// `false` only if `key` was definitely not among the keys the filter
    /// was built from.
    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool;
}

/// [`FilterPolicy`] backed by a [`BloomFilter`].
#[derive(Debug, Clone, Copy)]
pub struct BloomFilterPolicy {
    bits_per_key: usize,
}

impl BloomFilterPolicy {
    pub fn new(bits_per_key: usize) -> Self {
        BloomFilterPolicy {
            bits_per_key: bits_per_key.max(1),
        }
    }

    pub fn bits_per_key(&self) -> usize {
        self.bits_per_key
    }
}

impl FilterPolicy for BloomFilterPolicy {
    fn name(&self) -> &'static str {
        "lsm_core.Xxh3BloomFilter"
    }

    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>) {
        let mut filter = BloomFilter::with_bits_per_key(keys.len().max(1), self.bits_per_key as f64);
        for key in keys {
            filter.insert(key);
        }
        filter.serialize_into(dst);
    }

    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool {
        match BloomFilter::deserialize(filter) {
            Ok(filter) => filter.may_contain(key),
            // An unreadable filter cannot rule anything out.
            Err(_) => true,
        }
    }
}

/// Adapts a user-key [`FilterPolicy`] to internal keys by stripping the
/// sequence/type trailer before every call. Filters therefore match any
/// version of a user key.
#[derive(Clone)]
pub struct InternalFilterPolicy {
    user_policy: Arc<dyn FilterPolicy>,
}

impl InternalFilterPolicy {
    pub fn new(user_policy: Arc<dyn FilterPolicy>) -> Self {
        InternalFilterPolicy { user_policy }
    }

    pub fn user_policy(&self) -> &Arc<dyn FilterPolicy> {
        &self.user_policy
    }
}

impl FilterPolicy for InternalFilterPolicy {
    fn name(&self) -> &'static str {
        self.user_policy.name()
    }

    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>) {
        let user_keys: Vec<&[u8]> = keys.iter().map(|k| extract_user_key(k)).collect();
        self.user_policy.create_filter(&user_keys, dst);
    }

    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool {
        self.user_policy.key_may_match(extract_user_key(key), filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_filter_matches_everything() {
        let policy = BloomFilterPolicy::new(10);
        assert!(policy.key_may_match(b"anything", b"\x01"));
    }

    #[test]
    fn zero_bits_per_key_is_clamped() {
        assert_eq!(BloomFilterPolicy::new(0).bits_per_key(), 1);
    }
}
