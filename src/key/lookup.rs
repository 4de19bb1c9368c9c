use smallvec::SmallVec;

use crate::coding::{MAX_VARINT32_LEN, encode_varint32, length_as_u32, varint32_length};
use crate::key::internal::TRAILER_SIZE;
use crate::types::{SequenceNumber, VALUE_TYPE_FOR_SEEK, pack_sequence_and_type};

/// Keys whose whole encoding fits in this many bytes never touch the heap.
const INLINE_CAPACITY: usize = 200;

/// Probe key for a point lookup at a snapshot sequence.
///
/// One buffer, three views:
///
/// ```text
/// ┌────────────────────┬──────────────────┬──────────────────────┐
/// │ klength (varint32) │ user key         │ tag (8B, LE)         │
/// └────────────────────┴──────────────────┴──────────────────────┘
/// ^ memtable_key       ^ internal_key / user_key                 ^ end
/// ```
///
/// `klength = len(user key) + 8`. The tag packs the snapshot sequence with
/// the seek value type so the probe lands on the newest entry visible at
/// that sequence.
pub struct LookupKey {
    buf: SmallVec<[u8; INLINE_CAPACITY]>,
    kstart: usize,
}

impl LookupKey {
    /// # Panics
    /// If the internal key length does not fit in a varint32.
    pub fn new(user_key: &[u8], sequence: SequenceNumber) -> Self {
        let klength = user_key.len() + TRAILER_SIZE;
        let prefix_value = length_as_u32(klength);
        let mut buf = SmallVec::with_capacity(varint32_length(prefix_value) + klength);

        let mut prefix = [0u8; MAX_VARINT32_LEN];
        let kstart = encode_varint32(&mut prefix, prefix_value);
        buf.extend_from_slice(&prefix[..kstart]);
        buf.extend_from_slice(user_key);
        buf.extend_from_slice(&pack_sequence_and_type(sequence, VALUE_TYPE_FOR_SEEK).to_le_bytes());

        LookupKey { buf, kstart }
    }

    /// Key suitable for probing a memtable: the full buffer.
    pub fn memtable_key(&self) -> &[u8] {
        &self.buf
    }

    /// Internal key: user key plus tag, without the length prefix.
    pub fn internal_key(&self) -> &[u8] {
        &self.buf[self.kstart..]
    }

    pub fn user_key(&self) -> &[u8] {
        &self.buf[self.kstart..self.buf.len() - TRAILER_SIZE]
    }

    /// Whether the buffer spilled to the heap.
    pub fn spilled(&self) -> bool {
        self.buf.spilled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_keys_stay_inline() {
        let key = LookupKey::new(b"abc", 5);
        assert!(!key.spilled());
        assert_eq!(key.memtable_key()[0], 11);
        assert_eq!(key.user_key(), b"abc");
    }

    #[test]
    fn long_keys_spill() {
        let user_key = vec![b'x'; 500];
        let key = LookupKey::new(&user_key, 5);
        assert!(key.spilled());
        assert_eq!(key.user_key(), user_key.as_slice());
        // 508 needs a two-byte varint.
        assert_eq!(key.internal_key().len(), 508);
        assert_eq!(key.memtable_key().len(), 510);
    }
}
