//! Versioned keys: the internal key codec, its comparator, and the lookup
//! key used to probe a memtable.

pub mod comparator;
pub mod internal;
pub mod lookup;

pub use comparator::InternalKeyComparator;
pub use internal::{
    InternalKey, ParsedInternalKey, TRAILER_SIZE, append_internal_key, extract_user_key,
    parse_internal_key,
};
pub use lookup::LookupKey;
