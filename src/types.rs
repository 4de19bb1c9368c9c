//! Primitive types shared by every layer that touches internal keys.

use crate::error::{Error, Result};

/// Logical time of a mutation. Only the low 56 bits are usable: the
/// bottom byte of the packed trailer holds the [`ValueType`].
pub type SequenceNumber = u64;

/// Largest sequence number that still fits in the 56-bit trailer field.
pub const MAX_SEQUENCE_NUMBER: SequenceNumber = (1 << 56) - 1;

/// Distinguishes value writes from deletion markers.
///
/// The discriminants are embedded in on-disk data. DO NOT renumber them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// A delete (tombstone marker).
    Deletion = 0x0,
    /// A normal put operation.
    Value = 0x1,
}

/// Value type used when building a key to seek to a given sequence.
///
/// Sequence and type share one trailer word that sorts descending, so the
/// probe must carry the highest-numbered type to land at or before every
/// entry with the same sequence.
pub const VALUE_TYPE_FOR_SEEK: ValueType = ValueType::Value;

impl ValueType {
    /// Decode a trailer type byte. Anything above the highest defined code
    /// is treated as corruption.
    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x0 => Ok(ValueType::Deletion),
            0x1 => Ok(ValueType::Value),
            _ => Err(Error::Corruption(format!("invalid value type: {byte}"))),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Pack a sequence number and value type into the 64-bit trailer word:
/// `(sequence << 8) | type`.
#[inline]
pub fn pack_sequence_and_type(sequence: SequenceNumber, value_type: ValueType) -> u64 {
    debug_assert!(
        sequence <= MAX_SEQUENCE_NUMBER,
        "sequence number {sequence} exceeds 56 bits"
    );
    (sequence << 8) | value_type.as_u8() as u64
}
