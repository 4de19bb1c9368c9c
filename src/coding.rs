//! Fixed-width and variable-length integer encodings shared by the key
//! formats.
//!
//! Fixed-width integers are little-endian. Varints are the standard
//! base-128 encoding: 7 payload bits per byte, high bit set on every byte
//! except the last.

use integer_encoding::VarInt;

use crate::error::{Error, Result};

/// Longest possible varint32 encoding.
pub const MAX_VARINT32_LEN: usize = 5;

/// Append `value` as 8 little-endian bytes.
#[inline]
pub fn put_fixed64(dst: &mut Vec<u8>, value: u64) {
    dst.extend_from_slice(&value.to_le_bytes());
}

/// Read a little-endian u64 from the first 8 bytes of `src`.
#[inline]
pub fn decode_fixed64(src: &[u8]) -> u64 {
    debug_assert!(src.len() >= 8, "fixed64 needs 8 bytes, got {}", src.len());
    let mut word = [0u8; 8];
    word.copy_from_slice(&src[..8]);
    u64::from_le_bytes(word)
}

/// Encode `value` into `dst`, returning the number of bytes written.
/// `dst` must hold at least [`MAX_VARINT32_LEN`] bytes.
#[inline]
pub fn encode_varint32(dst: &mut [u8], value: u32) -> usize {
    value.encode_var(dst)
}

/// Narrow a length to the u32 carried by a varint32 prefix.
///
/// # Panics
/// If `len` does not fit in a u32. A truncated prefix would silently
/// mis-frame everything after it.
#[inline]
pub fn length_as_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("length {len} exceeds the varint32 range"))
}

/// Append `value` as a varint32.
pub fn put_varint32(dst: &mut Vec<u8>, value: u32) {
    let mut buf = [0u8; MAX_VARINT32_LEN];
    let n = encode_varint32(&mut buf, value);
    dst.extend_from_slice(&buf[..n]);
}

/// Number of bytes `value` occupies as a varint32.
#[inline]
pub fn varint32_length(value: u32) -> usize {
    value.required_space()
}

/// Decode a varint32 from the front of `src`, returning the value and the
/// number of bytes consumed.
pub fn get_varint32(src: &[u8]) -> Result<(u32, usize)> {
    u32::decode_var(src).ok_or_else(|| Error::Corruption("bad varint32".into()))
}

/// Decode a varint32 length prefix followed by that many bytes. Returns the
/// payload and the total number of bytes consumed.
pub fn get_length_prefixed_slice(src: &[u8]) -> Result<(&[u8], usize)> {
    let (len, prefix) = get_varint32(src)?;
    let end = prefix + len as usize;
    if src.len() < end {
        return Err(Error::Corruption("length-prefixed slice truncated".into()));
    }
    Ok((&src[prefix..end], end))
}
