//! The segregated-list allocation engine.
//!
//! [`RawAllocator`] composes the six layers described at the crate root into
//! the four allocation primitives `GlobalAlloc` needs. It knows nothing
//! about [`core::alloc::Layout`] or raw pointers - it works purely in byte
//! offsets into its [`Buffer`](buffer::Buffer), and is not `Sync`;
//! [`crate::Allocator`] is the thin wrapper that adapts it to `GlobalAlloc`
//! and serializes access with a mutex.
mod block;
mod buffer;
mod check;
mod coalesce;
mod free_list;
mod heap;
mod placement;
mod word;

use buffer::Buffer;
use free_list::FreeLists;
use word::{Word, WORD_SIZE};

/// Minimum usable heap size: the prologue word, the fixed 64-byte initial
/// extension, and the epilogue word that follows it. Below this, the
/// allocator can never complete even a single allocation.
pub(crate) const MIN_HEAP_SIZE: usize = 2 * WORD_SIZE + 64;

/// The raw, single-threaded allocation engine backing [`crate::Allocator`].
///
/// `N` is the total byte capacity available to the heap; the heap itself
/// starts out empty and grows into this capacity lazily (see
/// [`RawAllocator::ensure_init`]).
pub(crate) struct RawAllocator<const N: usize> {
    buffer: Buffer<N>,
    free_lists: FreeLists,
    initialized: bool,
}
impl<const N: usize> RawAllocator<N> {
    /// Create a new, uninitialized allocator.
    ///
    /// # Panics
    /// Panics if `N` is smaller than [`MIN_HEAP_SIZE`] or not a multiple of
    /// 16.
    pub(crate) const fn new() -> Self {
        assert!(N >= MIN_HEAP_SIZE, "too small heap memory: minimum size is 80");
        assert!(N % 16 == 0, "memory size has to be divisible by 16");
        Self {
            buffer: Buffer::new(),
            free_lists: FreeLists::new(),
            initialized: false,
        }
    }

    /// Allocate `n` payload bytes, returning the payload's byte offset.
    ///
    /// A zero-sized request and an out-of-memory heap both return `None`;
    /// [`crate::Allocator`] is responsible for telling those apart.
    pub(crate) fn alloc(&mut self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        self.ensure_init()?;

        let asize = Self::adjusted_size(n);
        let fit = match self.find_fit(asize) {
            Some(fit) => fit,
            None => self.extend(core::cmp::max(asize, 64))?,
        };
        self.split(fit, asize);
        Some(Buffer::<N>::payload_of(fit))
    }

    /// Free the block owning `payload`. A no-op if `payload` is the null
    /// sentinel (offset 0); double-free and foreign pointers are undefined
    /// behavior here, not a detected error (there is no room in a packed
    /// header word to distinguish "free" from "never allocated").
    pub(crate) fn free(&mut self, payload: usize) {
        if payload == 0 {
            return;
        }
        let block = Buffer::<N>::block_of(payload);
        let header = self.buffer.header(block);
        let freed = Word::pack(header.size(), false, header.prev_alloc(), header.prev_mini());
        self.buffer.set_header(block, freed);
        if freed.size() >= 32 {
            self.buffer.set_footer(block, freed);
        }
        self.coalesce(block);
    }

    /// Reallocate the block owning `payload` to hold `n` bytes.
    ///
    /// There is no in-place growth: this always allocates a fresh block,
    /// copies `min(n, old_size)` bytes, and frees the original. `n == 0`
    /// behaves like `free`; `payload == 0` behaves like `alloc`.
    pub(crate) fn realloc(&mut self, payload: usize, n: usize) -> Option<usize> {
        if n == 0 {
            self.free(payload);
            return None;
        }
        if payload == 0 {
            return self.alloc(n);
        }

        let block = Buffer::<N>::block_of(payload);
        let old_payload_size = self.buffer.header(block).size() - WORD_SIZE;
        let new_payload = self.alloc(n)?;

        let copy_len = core::cmp::min(n, old_payload_size);
        self.buffer.copy_bytes(payload, new_payload, copy_len);
        self.free(payload);
        Some(new_payload)
    }

    /// Allocate `count * n` zeroed bytes, guarding against the
    /// multiplication overflowing.
    pub(crate) fn zero_alloc(&mut self, count: usize, n: usize) -> Option<usize> {
        let total = count.checked_mul(n)?;
        let payload = self.alloc(total)?;
        self.buffer.zero_bytes(payload, total);
        Some(payload)
    }

    /// The base address of the heap buffer.
    pub(crate) fn base_ptr(&mut self) -> *mut u8 {
        self.buffer.base_ptr()
    }

    /// The byte offset of `ptr` within the heap buffer.
    pub(crate) fn offset_of(&self, ptr: *mut u8) -> usize {
        self.buffer.offset_of(ptr)
    }
}
