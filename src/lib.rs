//! # LSM-Tree Key Format and Arena
//!
//! The ordering and allocation substrate under an LSM-tree key-value store.
//!
//! ## Core idea
//! Every mutation gets a sequence number. Instead of overwriting a key,
//! the engine stores an *internal key* (user key, sequence, operation
//! type) and orders internal keys user key ascending, sequence
//! descending. A read at snapshot `s` seeks to `(key, s)` and takes the
//! first entry it lands on; compaction finds obsolete versions adjacent.
//!
//! The memtable that buffers those writes allocates everything from an
//! [`Arena`](arena::Arena) and frees it all at once after a flush.

pub mod arena;
pub mod bloom;
pub mod coding;
pub mod comparator;
pub mod error;
pub mod iterator;
pub mod key;
pub mod memtable;
pub mod options;
pub mod types;

// Public re-exports for the top-level API
pub use arena::{Arena, MemoryUsage};
pub use comparator::{BytewiseComparator, Comparator, bytewise_comparator};
pub use error::{Error, Result};
pub use key::{InternalKey, InternalKeyComparator, LookupKey, ParsedInternalKey};
pub use memtable::{LookupResult, MemTable};
pub use options::Options;
pub use types::{MAX_SEQUENCE_NUMBER, SequenceNumber, VALUE_TYPE_FOR_SEEK, ValueType};
