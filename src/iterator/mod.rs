use crate::error::Result;

/// Cursor over a sorted source of internal-key entries.
///
/// Keys are encoded internal keys, ordered by the source's
/// [`InternalKeyComparator`](crate::key::InternalKeyComparator).
pub trait StorageIterator {
    /// Returns the current key. Only valid when is_valid() is true.
    fn key(&self) -> &[u8];

    /// Returns the current value. Only valid when is_valid() is true.
    fn value(&self) -> &[u8];

    /// Returns true if the iterator is positioned at a valid entry.
    fn is_valid(&self) -> bool;

    /// Advances to the next entry.
    fn next(&mut self) -> Result<()>;

    /// Positions the iterator at the first entry with key >= target.
    fn seek(&mut self, key: &[u8]) -> Result<()>;

    /// Positions the iterator at the smallest entry.
    fn seek_to_first(&mut self) -> Result<()>;
}
