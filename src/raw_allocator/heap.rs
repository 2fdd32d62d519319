//! Growing the heap: the realization of the "page provider" abstraction and
//! the extension procedure built on top of it.
//!
//! A real page provider would ask the OS (or a bootloader-provided memory
//! map) for more address space. This crate has neither, so growing the heap
//! just means advancing a high-water mark inside the fixed-capacity
//! [`Buffer`](super::buffer::Buffer) that `Allocator<N>` owns; running past
//! `N` is the provider's failure sentinel.

use super::free_list::class_of;
use super::word::{Word, WORD_SIZE};
use super::RawAllocator;

/// The size, in bytes, of the first real heap extension, performed lazily
/// the first time the allocator is used.
const INITIAL_CHUNK: usize = 64;

impl<const N: usize> RawAllocator<N> {
    /// Idempotently write the prologue/epilogue sentinels and perform the
    /// first heap extension, if that hasn't happened yet.
    ///
    /// Returns `None` if the buffer is too small to even hold the initial
    /// extension - the page provider's OOM sentinel, not a panic, since a
    /// small `N` is a valid (if useless) configuration.
    pub(crate) fn ensure_init(&mut self) -> Option<()> {
        if self.initialized {
            return Some(());
        }
        // two sentinel words: an allocated, zero-size prologue and an
        // (initially adjacent) allocated, zero-size epilogue.
        self.buffer.set_header(0, Word::pack(0, true, true, false));
        self.buffer
            .set_header(WORD_SIZE, Word::pack(0, true, true, false));
        self.buffer.heap_end = 2 * WORD_SIZE;
        self.initialized = true;

        self.extend(INITIAL_CHUNK)?;
        Some(())
    }

    /// Grow the heap by at least `requested_bytes`, returning the offset of
    /// the resulting free block (after coalescing with whatever was the
    /// last block before the extension).
    pub(crate) fn extend(&mut self, requested_bytes: usize) -> Option<usize> {
        let delta = super::placement::round_up_16(requested_bytes);

        let old_epilogue = self.buffer.heap_end - WORD_SIZE;
        let new_heap_end = old_epilogue + delta + WORD_SIZE;
        if new_heap_end > self.buffer.capacity() {
            return None; // the page provider refuses to grow this far
        }
        let old_epilogue_header = self.buffer.header(old_epilogue);

        let new_block = old_epilogue;
        let free_header = Word::pack(
            delta,
            false,
            old_epilogue_header.prev_alloc(),
            old_epilogue_header.prev_mini(),
        );
        self.buffer.set_header(new_block, free_header);
        if delta >= 32 {
            self.buffer.set_footer(new_block, free_header);
        }

        let new_epilogue = new_block + delta;
        self.buffer
            .set_header(new_epilogue, Word::pack(0, true, false, delta == 16));
        self.buffer.heap_end = new_heap_end;

        Some(self.coalesce(new_block))
    }
}
