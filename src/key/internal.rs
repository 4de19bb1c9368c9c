use std::fmt;

use crate::coding::{decode_fixed64, put_fixed64};
use crate::error::{Error, Result};
use crate::types::{SequenceNumber, ValueType, pack_sequence_and_type};

/// Size of the packed `(sequence << 8) | type` trailer.
pub const TRAILER_SIZE: usize = 8;

/// Decomposed view of an internal key. Borrows the user key bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ParsedInternalKey<'a> {
    pub user_key: &'a [u8],
    pub sequence: SequenceNumber,
    pub value_type: ValueType,
}

impl<'a> ParsedInternalKey<'a> {
    pub fn new(user_key: &'a [u8], sequence: SequenceNumber, value_type: ValueType) -> Self {
        ParsedInternalKey {
            user_key,
            sequence,
            value_type,
        }
    }

    /// Length of this key once encoded.
    pub fn encoded_len(&self) -> usize {
        self.user_key.len() + TRAILER_SIZE
    }
}

impl fmt::Display for ParsedInternalKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' @ {} : {}",
            self.user_key.escape_ascii(),
            self.sequence,
            self.value_type.as_u8()
        )
    }
}

impl fmt::Debug for ParsedInternalKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Append the encoding of `key` to `dst`:
///
/// ```text
/// ┌──────────────────────┬───────────────────────────────────┐
/// │ user key (var)       │ (sequence << 8) | type  (8B, LE)  │
/// └──────────────────────┴───────────────────────────────────┘
/// ```
pub fn append_internal_key(dst: &mut Vec<u8>, key: &ParsedInternalKey<'_>) {
    dst.reserve(key.encoded_len());
    dst.extend_from_slice(key.user_key);
    put_fixed64(dst, pack_sequence_and_type(key.sequence, key.value_type));
}

/// Split an encoded internal key into its parts.
///
/// Fails with [`Error::Corruption`] when the input is shorter than the
/// trailer or the type byte is not a known [`ValueType`].
pub fn parse_internal_key(internal_key: &[u8]) -> Result<ParsedInternalKey<'_>> {
    let n = internal_key.len();
    if n < TRAILER_SIZE {
        return Err(Error::Corruption(format!(
            "internal key too short: {n} bytes"
        )));
    }
    let word = decode_fixed64(&internal_key[n - TRAILER_SIZE..]);
    let value_type = ValueType::from_u8((word & 0xFF) as u8)?;
    Ok(ParsedInternalKey {
        user_key: &internal_key[..n - TRAILER_SIZE],
        sequence: word >> 8,
        value_type,
    })
}

/// The user key portion of an encoded internal key. The caller guarantees
/// the input carries a trailer.
#[inline]
pub fn extract_user_key(internal_key: &[u8]) -> &[u8] {
    debug_assert!(
        internal_key.len() >= TRAILER_SIZE,
        "internal key shorter than its trailer"
    );
    &internal_key[..internal_key.len().saturating_sub(TRAILER_SIZE)]
}

/// The raw trailer word of an encoded internal key.
#[inline]
pub(crate) fn extract_trailer(internal_key: &[u8]) -> u64 {
    debug_assert!(internal_key.len() >= TRAILER_SIZE);
    decode_fixed64(&internal_key[internal_key.len() - TRAILER_SIZE..])
}

/// Owned, encoded internal key.
///
/// Code that handles internal keys should keep them wrapped in this type
/// rather than plain byte vectors so they are never compared bytewise by
/// mistake. The default value is empty and therefore invalid: encoding or
/// comparing it is a logic error.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InternalKey {
    rep: Vec<u8>,
}

impl InternalKey {
    pub fn new(user_key: &[u8], sequence: SequenceNumber, value_type: ValueType) -> Self {
        let mut rep = Vec::new();
        append_internal_key(&mut rep, &ParsedInternalKey::new(user_key, sequence, value_type));
        InternalKey { rep }
    }

    /// Replace the contents with a copy of `encoded`. Returns whether the
    /// result is non-empty; the bytes are not otherwise validated.
    pub fn decode_from(&mut self, encoded: &[u8]) -> bool {
        self.rep.clear();
        self.rep.extend_from_slice(encoded);
        !self.rep.is_empty()
    }

    /// The encoded bytes.
    pub fn encode(&self) -> &[u8] {
        debug_assert!(!self.rep.is_empty(), "encoding an empty internal key");
        &self.rep
    }

    pub fn user_key(&self) -> &[u8] {
        extract_user_key(&self.rep)
    }

    pub fn set_from(&mut self, parsed: &ParsedInternalKey<'_>) {
        self.rep.clear();
        append_internal_key(&mut self.rep, parsed);
    }

    pub fn clear(&mut self) {
        self.rep.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rep.is_empty()
    }

    pub fn parse(&self) -> Result<ParsedInternalKey<'_>> {
        parse_internal_key(&self.rep)
    }
}

impl fmt::Debug for InternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match parse_internal_key(&self.rep) {
            Ok(parsed) => write!(f, "{parsed}"),
            Err(_) => write!(f, "(bad){}", self.rep.escape_ascii()),
        }
    }
}
