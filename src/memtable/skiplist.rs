use std::cmp::Ordering;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arena::{ALIGN, Arena, MemoryUsage};
use crate::coding::{MAX_VARINT32_LEN, encode_varint32, length_as_u32};
use crate::comparator::Comparator;
use crate::error::Result;
use crate::iterator::StorageIterator;
use crate::key::InternalKeyComparator;

/// Maximum height of the skip list. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// Each level holds roughly 1/BRANCHING of the nodes of the level below.
const BRANCHING: u32 = 4;

/// Forward link to another node; `None` is NIL.
type Link = Option<NonNull<Node>>;

/// Header of a skip list node. Header, tower and entry bytes are one
/// aligned arena allocation:
///
/// ```text
/// ┌────────────┬──────────────────────┬──────────────────────────────────────┐
/// │ Node       │ tower: height × Link │ entry                                │
/// │ (offsets)  │ (level 0 first)      │ klen varint | ikey | vlen varint | v │
/// └────────────┴──────────────────────┴──────────────────────────────────────┘
/// ```
///
/// Level 0 links every node; higher levels skip ahead.
///
/// ```text
/// Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
#[repr(C)]
struct Node {
    height: usize,
    entry_len: usize,
    key_start: usize,
    key_end: usize,
    value_start: usize,
}

const _: () = assert!(mem::align_of::<Node>() <= ALIGN && mem::align_of::<Link>() <= ALIGN);
const _: () = assert!(mem::size_of::<Node>() % mem::align_of::<Link>() == 0);

impl Node {
    /// Arena bytes for a node of `height` levels holding `entry_len` bytes.
    const fn allocation_size(height: usize, entry_len: usize) -> usize {
        mem::size_of::<Node>() + height * mem::size_of::<Link>() + entry_len
    }

    /// # Safety
    /// `node` must point at an initialized node header.
    unsafe fn tower(node: NonNull<Node>) -> *mut Link {
        unsafe { node.as_ptr().add(1).cast::<Link>() }
    }

    /// # Safety
    /// `node` must point at an initialized node header.
    unsafe fn entry_ptr(node: NonNull<Node>) -> *mut u8 {
        unsafe { Node::tower(node).add((*node.as_ptr()).height).cast::<u8>() }
    }
}

/// Sorted index of internal-key entries, backed by one arena.
///
/// Every byte of a node (header, forward tower and entry) comes from the
/// arena, so [`SkipList::memory_usage`] is the memory the list holds.
/// Entries are never removed or overwritten: every mutation carries a
/// fresh sequence number, so every internal key inserted is distinct.
pub struct SkipList {
    arena: Arena,
    comparator: InternalKeyComparator,
    head: [Link; MAX_HEIGHT],
    height: usize,
    len: usize,
    rng: StdRng,
}

// SAFETY: every node pointer refers into blocks owned by `arena`, which
// moves with the list. Nodes are only written through `&mut self`; shared
// access only reads fully linked nodes.
unsafe impl Send for SkipList {}
unsafe impl Sync for SkipList {}

impl SkipList {
    pub fn new(comparator: InternalKeyComparator, arena: Arena) -> Self {
        SkipList {
            arena,
            comparator,
            head: [None; MAX_HEIGHT],
            height: 1,
            len: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Insert an internal key and its value.
    ///
    /// Algorithm:
    ///   1. Find the insertion point at each level (track predecessors)
    ///   2. Generate a random height for the new node
    ///   3. Write header, tower and entry into one arena allocation
    ///   4. Splice into the list at each level up to the node's height
    ///
    /// # Panics
    /// If the key or value is 4 GiB or longer.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        let mut prev = [None; MAX_HEIGHT];
        let found = self.find_greater_or_equal(key, Some(&mut prev));
        debug_assert!(
            found.is_none_or(|n| self.comparator.compare(self.node_key(n), key) != Ordering::Equal),
            "duplicate internal key inserted"
        );

        let height = self.random_height();
        if height > self.height {
            // Levels above the old height are reached straight from HEAD.
            for slot in &mut prev[self.height..height] {
                *slot = None;
            }
            self.height = height;
        }

        let node = self.new_node(height, key, value);
        for (level, p) in prev.iter().enumerate().take(height) {
            // SAFETY: `node` has `height` tower slots and `p` is a linked node
            // that reaches `level`, since it was recorded on that level.
            unsafe {
                *Node::tower(node).add(level) = self.next_at(*p, level);
                match p {
                    None => self.head[level] = Some(node),
                    Some(p) => *Node::tower(*p).add(level) = Some(node),
                }
            }
        }
        self.len += 1;
    }

    /// Whether an entry with exactly this internal key exists.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.find_greater_or_equal(key, None)
            .is_some_and(|n| self.comparator.compare(self.node_key(n), key) == Ordering::Equal)
    }

    /// First entry whose internal key is >= `key`, as `(internal key, value)`.
    pub fn seek_entry(&self, key: &[u8]) -> Option<(&[u8], &[u8])> {
        self.find_greater_or_equal(key, None)
            .map(|n| (self.node_key(n), self.node_value(n)))
    }

    /// Number of entries in the skip list.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes held by the backing arena: every node and entry in the list.
    pub fn memory_usage(&self) -> usize {
        self.arena.memory_usage()
    }

    pub fn usage_tracker(&self) -> MemoryUsage {
        self.arena.usage_tracker()
    }

    pub fn comparator(&self) -> &InternalKeyComparator {
        &self.comparator
    }

    /// Iterator positioned at the first entry. Level 0 contains every entry.
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            list: self,
            current: self.head[0],
        }
    }

    /// Allocate a node with an unlinked tower and copy the entry in.
    fn new_node(&mut self, height: usize, key: &[u8], value: &[u8]) -> NonNull<Node> {
        let mut key_prefix = [0u8; MAX_VARINT32_LEN];
        let key_prefix_len = encode_varint32(&mut key_prefix, length_as_u32(key.len()));
        let mut value_prefix = [0u8; MAX_VARINT32_LEN];
        let value_prefix_len = encode_varint32(&mut value_prefix, length_as_u32(value.len()));

        let key_start = key_prefix_len;
        let key_end = key_start + key.len();
        let value_start = key_end + value_prefix_len;
        let entry_len = value_start + value.len();

        let node = self
            .arena
            .allocate_aligned(Node::allocation_size(height, entry_len))
            .cast::<Node>();
        // SAFETY: the region is fresh, aligned for `Node` and `Link`, and
        // sized for the header, `height` links and `entry_len` bytes.
        unsafe {
            node.as_ptr().write(Node {
                height,
                entry_len,
                key_start,
                key_end,
                value_start,
            });
            let tower = Node::tower(node);
            for level in 0..height {
                tower.add(level).write(None);
            }
            let entry = Node::entry_ptr(node);
            ptr::copy_nonoverlapping(key_prefix.as_ptr(), entry, key_prefix_len);
            ptr::copy_nonoverlapping(key.as_ptr(), entry.add(key_start), key.len());
            ptr::copy_nonoverlapping(value_prefix.as_ptr(), entry.add(key_end), value_prefix_len);
            ptr::copy_nonoverlapping(value.as_ptr(), entry.add(value_start), value.len());
        }
        node
    }

    fn entry(&self, node: NonNull<Node>) -> &[u8] {
        // SAFETY: nodes reachable from `self` were fully written by
        // `new_node` into arena memory that lives as long as `self`.
        unsafe {
            let len = (*node.as_ptr()).entry_len;
            slice::from_raw_parts(Node::entry_ptr(node), len)
        }
    }

    fn header(&self, node: NonNull<Node>) -> &Node {
        // SAFETY: as in `entry`; headers are never written after linking.
        unsafe { node.as_ref() }
    }

    fn node_key(&self, node: NonNull<Node>) -> &[u8] {
        let header = self.header(node);
        &self.entry(node)[header.key_start..header.key_end]
    }

    fn node_value(&self, node: NonNull<Node>) -> &[u8] {
        &self.entry(node)[self.header(node).value_start..]
    }

    /// Successor of `node` at `level`; `None` stands for HEAD.
    fn next_at(&self, node: Link, level: usize) -> Link {
        match node {
            None => self.head[level],
            Some(n) => {
                debug_assert!(level < self.header(n).height);
                // SAFETY: `n` is a linked node with more than `level` levels.
                unsafe { *Node::tower(n).add(level) }
            }
        }
    }

    /// Walk from the top level down, moving right while the next key is
    /// smaller than `key`. Records the last node visited on each level in
    /// `prev` when given.
    fn find_greater_or_equal(&self, key: &[u8], mut prev: Option<&mut [Link; MAX_HEIGHT]>) -> Link {
        let mut x = None;
        let mut level = self.height - 1;
        loop {
            let next = self.next_at(x, level);
            match next {
                Some(n) if self.comparator.compare(self.node_key(n), key) == Ordering::Less => {
                    x = Some(n);
                }
                _ => {
                    if let Some(prev) = prev.as_deref_mut() {
                        prev[level] = x;
                    }
                    if level == 0 {
                        return next;
                    }
                    level -= 1;
                }
            }
        }
    }

    /// Each extra level has a 1/BRANCHING chance. A higher branching factor
    /// means fewer levels and less memory.
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_HEIGHT && self.rng.gen_range(0..BRANCHING) == 0 {
            height += 1;
        }
        height
    }
}

/// Iterator over skip list entries in internal-key order.
///
/// Simply follows level 0 forward links; `seek` uses the full tower search.
pub struct SkipListIterator<'a> {
    list: &'a SkipList,
    current: Link,
}

impl<'a> SkipListIterator<'a> {
    /// Current internal key, borrowed for the list's lifetime.
    pub fn entry_key(&self) -> Option<&'a [u8]> {
        self.current.map(|n| self.list.node_key(n))
    }

    /// Current value, borrowed for the list's lifetime.
    pub fn entry_value(&self) -> Option<&'a [u8]> {
        self.current.map(|n| self.list.node_value(n))
    }
}

impl StorageIterator for SkipListIterator<'_> {
    fn key(&self) -> &[u8] {
        debug_assert!(self.is_valid());
        self.entry_key().unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        debug_assert!(self.is_valid());
        self.entry_value().unwrap_or_default()
    }

    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        if let Some(n) = self.current {
            self.current = self.list.next_at(Some(n), 0);
        }
        Ok(())
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        self.current = self.list.find_greater_or_equal(key, None);
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        self.current = self.list.head[0];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::InternalKey;
    use crate::types::ValueType;

    #[test]
    fn nodes_are_charged_to_the_arena() {
        let mut list = SkipList::new(InternalKeyComparator::default(), Arena::new());
        let n = 10_000u64;
        for i in 0..n {
            let key = InternalKey::new(&(i as u32).to_be_bytes(), i, ValueType::Value);
            list.insert(key.encode(), b"");
        }
        // klen varint + 12-byte internal key + vlen varint.
        let entry = 1 + 12 + 1;
        let floor = n as usize * Node::allocation_size(1, entry);
        assert!(
            list.memory_usage() >= floor,
            "usage {} below node floor {floor}",
            list.memory_usage()
        );
    }

    #[test]
    fn node_layout_round_trips() {
        let mut list = SkipList::new(InternalKeyComparator::default(), Arena::new());
        let key = InternalKey::new(b"k", 1, ValueType::Value);
        list.insert(key.encode(), b"value");
        let node = list.head[0].unwrap();
        assert!(list.header(node).height >= 1);
        assert_eq!(list.node_key(node), key.encode());
        assert_eq!(list.node_value(node), b"value");
        assert_eq!(list.next_at(Some(node), 0), None);
    }
}
