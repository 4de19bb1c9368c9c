use thiserror::Error;

/// Unified error type for the key format and memtable layers.
///
/// Comparators and the arena have no recoverable error surface: the
/// former are total, the latter aborts when the system allocator fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Data corruption detected (short internal key, unknown value type,
    /// truncated varint, bad filter encoding).
    #[error("Corruption: {0}")]
    Corruption(String),
    /// A caller supplied a configuration or argument that cannot be used.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
