//! Bump-pointer arena backing a memtable.
//!
//! Memory is carved out of blocks obtained from the global allocator and
//! is only returned when the whole arena is dropped. A memtable is
//! discarded as a unit after it is flushed, so freeing individual entries
//! would be wasted work.
//!
//! ```text
//! blocks:  [ block 0 (4096) ][ dedicated (3000) ][ block 1 (4096) ........ ]
//!                                                  ^ used     ^ alloc_ptr
//!                                                             |<-remaining->|
//! ```

use std::alloc::{self, Layout};
use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, trace};

/// Default size of a standard block.
pub const BLOCK_SIZE: usize = 4096;

/// Alignment guaranteed by [`Arena::allocate_aligned`].
pub const ALIGN: usize = if mem::size_of::<*mut u8>() > 8 {
    mem::size_of::<*mut u8>()
} else {
    8
};

const _: () = assert!(ALIGN & (ALIGN - 1) == 0, "pointer size should be a power of 2");

/// Bookkeeping charged per block on top of its size: one block pointer.
pub const BLOCK_OVERHEAD: usize = mem::size_of::<*mut u8>();

/// One allocation from the global allocator. Never moved or resized.
struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Block {
    fn new(size: usize) -> Self {
        debug_assert!(size > 0);
        let layout = Layout::from_size_align(size, ALIGN)
            .unwrap_or_else(|_| panic!("arena block of {size} bytes exceeds isize::MAX"));
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Block { ptr, layout }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by `alloc` with this exact layout and is
        // released only here.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// Cloneable handle onto an arena's usage counter.
///
/// The arena itself allocates through `&mut self`, so observers on other
/// threads read the counter through this handle instead. The value is
/// advisory: it never synchronizes access to arena memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryUsage(Arc<AtomicUsize>);

impl MemoryUsage {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    fn add(&self, bytes: usize) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Block-based bump allocator.
///
/// Single writer: allocation takes `&mut self` and does no locking. Every
/// returned pointer stays valid and exclusively owned by the caller until
/// the arena is dropped; no two returned regions overlap.
pub struct Arena {
    alloc_ptr: *mut u8,
    alloc_bytes_remaining: usize,
    blocks: Vec<Block>,
    block_size: usize,
    memory_usage: MemoryUsage,
}

// SAFETY: the arena exclusively owns its blocks; the raw cursor only ever
// points into one of them.
unsafe impl Send for Arena {}

impl Arena {
    pub fn new() -> Self {
        Arena::with_block_size(BLOCK_SIZE)
    }

    /// Create an arena whose standard blocks are `block_size` bytes.
    ///
    /// # Panics
    /// Panics if `block_size` is 0.
    pub fn with_block_size(block_size: usize) -> Self {
        assert!(block_size > 0, "arena block size must be > 0");
        Arena {
            alloc_ptr: ptr::null_mut(),
            alloc_bytes_remaining: 0,
            blocks: Vec::new(),
            block_size,
            memory_usage: MemoryUsage::default(),
        }
    }

    /// Return `bytes` bytes of uninitialized memory with no alignment
    /// guarantee.
    pub fn allocate(&mut self, bytes: usize) -> NonNull<u8> {
        // Zero-byte results are ill-defined; callers never need them.
        debug_assert!(bytes > 0, "zero-byte arena allocation");
        if !self.alloc_ptr.is_null() && bytes <= self.alloc_bytes_remaining {
            let result = self.alloc_ptr;
            // SAFETY: bytes <= remaining, so the cursor stays within (or one
            // past the end of) the current block.
            unsafe {
                self.alloc_ptr = self.alloc_ptr.add(bytes);
                self.alloc_bytes_remaining -= bytes;
                return NonNull::new_unchecked(result);
            }
        }
        self.allocate_fallback(bytes)
    }

    /// Return `bytes` bytes aligned to [`ALIGN`]. Pad bytes skipped to reach
    /// alignment are wasted.
    pub fn allocate_aligned(&mut self, bytes: usize) -> NonNull<u8> {
        let current_mod = (self.alloc_ptr as usize) & (ALIGN - 1);
        let slop = if current_mod == 0 { 0 } else { ALIGN - current_mod };
        let fits = bytes
            .checked_add(slop)
            .filter(|&needed| !self.alloc_ptr.is_null() && needed <= self.alloc_bytes_remaining);

        let result = if let Some(needed) = fits {
            // SAFETY: needed <= remaining keeps both pointers inside the block.
            unsafe {
                let result = self.alloc_ptr.add(slop);
                self.alloc_ptr = self.alloc_ptr.add(needed);
                self.alloc_bytes_remaining -= needed;
                NonNull::new_unchecked(result)
            }
        } else {
            // Fresh blocks are always aligned.
            self.allocate_fallback(bytes)
        };
        debug_assert_eq!(result.as_ptr() as usize & (ALIGN - 1), 0);
        result
    }

    /// Copy `data` into an aligned arena region and return its start. An
    /// empty slice still yields a valid, aligned pointer.
    pub fn allocate_copy(&mut self, data: &[u8]) -> NonNull<u8> {
        let dst = self.allocate_aligned(data.len());
        // SAFETY: dst is a fresh region of data.len() bytes that cannot
        // overlap a borrowed slice.
        unsafe { ptr::copy_nonoverlapping(data.as_ptr(), dst.as_ptr(), data.len()) };
        dst
    }

    /// Total bytes obtained from the system allocator, plus per-block
    /// bookkeeping.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage.get()
    }

    /// Handle for reading [`Arena::memory_usage`] from another thread.
    pub fn usage_tracker(&self) -> MemoryUsage {
        self.memory_usage.clone()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn allocate_fallback(&mut self, bytes: usize) -> NonNull<u8> {
        if bytes > self.block_size / 4 {
            // More than a quarter block: give it its own block so the
            // current block's leftover space is not thrown away.
            debug!(bytes, "arena: dedicated block");
            return self.allocate_new_block(bytes);
        }

        // The rest of the current block is wasted.
        let block = self.allocate_new_block(self.block_size);
        // SAFETY: bytes <= block_size / 4 < block_size.
        self.alloc_ptr = unsafe { block.as_ptr().add(bytes) };
        self.alloc_bytes_remaining = self.block_size - bytes;
        block
    }

    fn allocate_new_block(&mut self, block_bytes: usize) -> NonNull<u8> {
        let block = Block::new(block_bytes);
        let ptr = block.ptr;
        self.blocks.push(block);
        self.memory_usage.add(block_bytes + BLOCK_OVERHEAD);
        trace!(
            block_bytes,
            blocks = self.blocks.len(),
            usage = self.memory_usage.get(),
            "arena: new block"
        );
        ptr
    }
}

impl Default for Arena {
    fn default() -> Self {
        Arena::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("block_size", &self.block_size)
            .field("blocks", &self.blocks.len())
            .field("alloc_bytes_remaining", &self.alloc_bytes_remaining)
            .field("memory_usage", &self.memory_usage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_arena_uses_nothing() {
        let arena = Arena::new();
        assert_eq!(arena.memory_usage(), 0);
    }

    #[test]
    fn carve_outs_are_contiguous() {
        let mut arena = Arena::new();
        let a = arena.allocate(10).as_ptr() as usize;
        let b = arena.allocate(20).as_ptr() as usize;
        assert_eq!(b, a + 10);
        assert_eq!(arena.memory_usage(), BLOCK_SIZE + BLOCK_OVERHEAD);
    }

    #[test]
    fn copy_lands_in_arena() {
        let mut arena = Arena::new();
        arena.allocate(3);
        let ptr = arena.allocate_copy(b"hello");
        assert_eq!(ptr.as_ptr() as usize % ALIGN, 0);
        // SAFETY: five bytes were just written at ptr.
        let copied = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 5) };
        assert_eq!(copied, b"hello");
    }

    #[test]
    fn empty_copy_is_aligned_and_free() {
        let mut arena = Arena::new();
        let ptr = arena.allocate_copy(&[]);
        assert_eq!(ptr.as_ptr() as usize % ALIGN, 0);
        let next = arena.allocate(4);
        assert_eq!(next, ptr);
    }
}
