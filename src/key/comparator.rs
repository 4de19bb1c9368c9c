use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::coding::put_fixed64;
use crate::comparator::{Comparator, bytewise_comparator};
use crate::key::internal::{InternalKey, extract_trailer, extract_user_key};
use crate::types::{MAX_SEQUENCE_NUMBER, VALUE_TYPE_FOR_SEEK, pack_sequence_and_type};

/// Orders internal keys: user key ascending (by the wrapped user
/// comparator), then trailer word descending.
///
/// Because the trailer is `(sequence << 8) | type`, the newest version of a
/// user key sorts first, and at an equal sequence `Value` sorts before
/// `Deletion`.
///
/// ```text
/// ("a", 9, Value) < ("a", 9, Deletion) < ("a", 3, Value) < ("b", 12, Value)
/// ```
#[derive(Clone)]
pub struct InternalKeyComparator {
    user_comparator: Arc<dyn Comparator>,
}

impl InternalKeyComparator {
    pub fn new(user_comparator: Arc<dyn Comparator>) -> Self {
        InternalKeyComparator { user_comparator }
    }

    pub fn user_comparator(&self) -> &Arc<dyn Comparator> {
        &self.user_comparator
    }

    pub fn compare_keys(&self, a: &InternalKey, b: &InternalKey) -> Ordering {
        self.compare(a.encode(), b.encode())
    }

    /// Shared tail of both shortening helpers: accept the shortened user key
    /// only if it actually shrank and moved forward, then re-attach the
    /// earliest possible trailer for it.
    fn replace_if_shorter(&self, key: &mut Vec<u8>, user_key: &[u8], shortened: Vec<u8>) {
        if shortened.len() < user_key.len()
            && self.user_comparator.compare(user_key, &shortened) == Ordering::Less
        {
            let mut replacement = shortened;
            put_fixed64(
                &mut replacement,
                pack_sequence_and_type(MAX_SEQUENCE_NUMBER, VALUE_TYPE_FOR_SEEK),
            );
            *key = replacement;
        }
    }
}

impl Default for InternalKeyComparator {
    fn default() -> Self {
        InternalKeyComparator::new(bytewise_comparator())
    }
}

impl fmt::Debug for InternalKeyComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalKeyComparator")
            .field("user_comparator", &self.user_comparator.name())
            .finish()
    }
}

impl Comparator for InternalKeyComparator {
    fn name(&self) -> &'static str {
        "leveldb.InternalKeyComparator"
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self.user_comparator
            .compare(extract_user_key(a), extract_user_key(b))
            .then_with(|| extract_trailer(b).cmp(&extract_trailer(a)))
    }

    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]) {
        let user_start = extract_user_key(start).to_vec();
        let user_limit = extract_user_key(limit);
        let mut shortened = user_start.clone();
        self.user_comparator
            .find_shortest_separator(&mut shortened, user_limit);
        self.replace_if_shorter(start, &user_start, shortened);
    }

    fn find_short_successor(&self, key: &mut Vec<u8>) {
        let user_key = extract_user_key(key).to_vec();
        let mut shortened = user_key.clone();
        self.user_comparator.find_short_successor(&mut shortened);
        self.replace_if_shorter(key, &user_key, shortened);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn ikey(user_key: &[u8], seq: u64, vt: ValueType) -> Vec<u8> {
        InternalKey::new(user_key, seq, vt).encode().to_vec()
    }

    #[test]
    fn trailer_breaks_ties_descending() {
        let cmp = InternalKeyComparator::default();
        let newer = ikey(b"a", 9, ValueType::Value);
        let older = ikey(b"a", 3, ValueType::Value);
        assert_eq!(cmp.compare(&newer, &older), Ordering::Less);
        assert_eq!(cmp.compare(&older, &newer), Ordering::Greater);
        assert_eq!(cmp.compare(&newer, &newer), Ordering::Equal);
    }

    #[test]
    fn separator_appends_seek_trailer() {
        let cmp = InternalKeyComparator::default();
        let mut start = ikey(b"foo", 100, ValueType::Value);
        cmp.find_shortest_separator(&mut start, &ikey(b"hello", 200, ValueType::Value));
        assert_eq!(start, ikey(b"g", MAX_SEQUENCE_NUMBER, VALUE_TYPE_FOR_SEEK));
    }

    #[test]
    fn debug_names_user_comparator() {
        let cmp = InternalKeyComparator::default();
        assert_eq!(
            format!("{cmp:?}"),
            "InternalKeyComparator { user_comparator: \"leveldb.BytewiseComparator\" }"
        );
    }
}
