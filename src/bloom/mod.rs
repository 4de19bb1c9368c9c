//! Bloom filters over user keys.
//!
//! A table's filter block answers "could this user key be here?" before
//! any data block is read. A miss is definitive; a hit may be a false
//! positive at roughly the configured rate.

pub mod policy;

pub use policy::{BloomFilterPolicy, FilterPolicy, InternalFilterPolicy};

use xxhash_rust::xxh3::xxh3_128;

use crate::error::{Error, Result};

/// Bit set probed at `num_hashes` positions per key.
///
/// Positions come from one xxh3-128 hash split into two 64-bit halves:
/// probe `i` lands on `(lo + i * hi) mod num_bits`. At 10 bits per key
/// that gives 7 probes and about 1% false positives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_hashes: u32,
    num_bits: u32,
}

/// Serialized header: num_hashes (4B) + num_bits (4B).
const HEADER_SIZE: usize = 8;

/// Upper bound on probes per key; larger values only burn CPU.
const MAX_HASHES: u32 = 30;

impl BloomFilter {
    /// Filter for `expected_items` keys at a target false-positive rate.
    ///
    /// # Panics
    /// If `expected_items` is 0 or the rate is outside (0, 1).
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        assert!(expected_items > 0, "expected_items must be > 0");
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "FPR must be in (0, 1)"
        );
        let bits_per_key = -1.44 * false_positive_rate.log2();
        Self::with_bits_per_key(expected_items, bits_per_key)
    }

    /// Create a filter for `expected_items` keys using `bits_per_key` bits
    /// each. This is how table builders size filters.
    pub fn with_bits_per_key(expected_items: usize, bits_per_key: f64) -> Self {
        let num_bits = ((expected_items as f64) * bits_per_key).ceil() as u32;
        // Tiny key counts would otherwise get a very high FPR.
        let num_bits = num_bits.max(64);

        let num_hashes = (bits_per_key * 2.0f64.ln()).ceil() as u32;
        let num_hashes = num_hashes.clamp(1, MAX_HASHES);

        let num_u64s = (num_bits as usize).div_ceil(64);
        Self {
            bits: vec![0u64; num_u64s],
            num_hashes,
            num_bits,
        }
    }

    pub fn insert(&mut self, key: &[u8]) {
        let (lo, hi) = Self::probe_seeds(key);
        for i in 0..self.num_hashes {
            let pos = self.probe(lo, hi, i);
            self.set_bit(pos);
        }
    }

    /// `false` means the key was never inserted.
    pub fn may_contain(&self, key: &[u8]) -> bool {
        let (lo, hi) = Self::probe_seeds(key);
        (0..self.num_hashes).all(|i| self.check_bit(self.probe(lo, hi, i)))
    }

    /// Serialize the filter.
    ///
    /// ```text
    /// ┌────────────────┬──────────────┬──────────────────────────┐
    /// │ num_hashes (4B)│ num_bits (4B)│ bit words (8B each, LE)  │
    /// └────────────────┴──────────────┴──────────────────────────┘
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        self.serialize_into(&mut buf);
        buf
    }

    /// Append the serialized filter to `dst`.
    pub fn serialize_into(&self, dst: &mut Vec<u8>) {
        dst.reserve(self.serialized_size());
        dst.extend_from_slice(&self.num_hashes.to_le_bytes());
        dst.extend_from_slice(&self.num_bits.to_le_bytes());
        for word in &self.bits {
            dst.extend_from_slice(&word.to_le_bytes());
        }
    }

    /// Deserialize a filter produced by [`BloomFilter::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Corruption("bloom filter too short".into()));
        }
        let num_hashes = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let num_bits = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if num_hashes == 0 || num_hashes > MAX_HASHES || num_bits == 0 {
            return Err(Error::Corruption(format!(
                "bad bloom filter header: {num_hashes} hashes, {num_bits} bits"
            )));
        }

        let num_u64s = (num_bits as usize).div_ceil(64);
        let body = &data[HEADER_SIZE..];
        if body.len() != num_u64s * 8 {
            return Err(Error::Corruption(format!(
                "bloom filter body is {} bytes, expected {}",
                body.len(),
                num_u64s * 8
            )));
        }
        let bits = body
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect();

        Ok(Self {
            bits,
            num_hashes,
            num_bits,
        })
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    fn serialized_size(&self) -> usize {
        HEADER_SIZE + self.bits.len() * 8
    }

    fn probe_seeds(key: &[u8]) -> (u64, u64) {
        let h = xxh3_128(key);
        (h as u64, (h >> 64) as u64)
    }

    fn probe(&self, lo: u64, hi: u64, i: u32) -> u32 {
        (lo.wrapping_add(u64::from(i).wrapping_mul(hi)) % u64::from(self.num_bits)) as u32
    }

    fn set_bit(&mut self, pos: u32) {
        self.bits[(pos / 64) as usize] |= 1 << (pos % 64);
    }

    fn check_bit(&self, pos: u32) -> bool {
        (self.bits[(pos / 64) as usize] >> (pos % 64)) & 1 == 1
    }
}
