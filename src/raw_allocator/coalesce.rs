//! Merging a newly-freed block with its free physical neighbors.
//!
//! The four cases are distinguished purely by the freed block's own
//! `prev_alloc` flag and its right neighbor's `alloc` flag - no footer
//! lookup is needed unless the left neighbor turns out to be free. Whichever
//! case applies, the same three things always happen: any free neighbors
//! that participate get unlinked from their current free list, the combined
//! span gets one new header (and footer, if standard-sized), and the block
//! that ends up physically after the merged span gets its `prev_alloc`/
//! `prev_mini` flags republished - this last step is the one invariant I3
//! depends on that's easiest to forget.

use super::free_list::class_of;
use super::word::Word;
use super::RawAllocator;

impl<const N: usize> RawAllocator<N> {
    /// Merge the free block at `block` with any free physical neighbors,
    /// re-inserting the result into the appropriate free list.
    ///
    /// `block` must already be marked free in its header, and must not yet
    /// be linked into any free list (coalescing is responsible for that).
    pub(crate) fn coalesce(&mut self, block: usize) -> usize {
        let header = self.buffer.header(block);
        debug_assert!(!header.alloc(), "coalesce called on an allocated block");

        let next = self.buffer.next_in_heap(block);
        let next_header = self.buffer.header(next);

        let (start, size, prev_alloc, prev_mini) = match (header.prev_alloc(), next_header.alloc()) {
            // case 1: both neighbors allocated, nothing to merge
            (true, true) => (block, header.size(), header.prev_alloc(), header.prev_mini()),

            // case 2: only the next block is free
            (true, false) => {
                self.unlink(next);
                (block, header.size() + next_header.size(), header.prev_alloc(), header.prev_mini())
            }

            // case 3: only the previous block is free
            (false, true) => {
                let prev = self.buffer.prev_in_heap(block);
                let prev_header = self.buffer.header(prev);
                self.unlink(prev);
                (
                    prev,
                    prev_header.size() + header.size(),
                    prev_header.prev_alloc(),
                    prev_header.prev_mini(),
                )
            }

            // case 4: both neighbors are free
            (false, false) => {
                let prev = self.buffer.prev_in_heap(block);
                let prev_header = self.buffer.header(prev);
                self.unlink(prev);
                self.unlink(next);
                (
                    prev,
                    prev_header.size() + header.size() + next_header.size(),
                    prev_header.prev_alloc(),
                    prev_header.prev_mini(),
                )
            }
        };

        let merged = Word::pack(size, false, prev_alloc, prev_mini);
        self.buffer.set_header(start, merged);
        if size >= 32 {
            self.buffer.set_footer(start, merged);
        }

        // I3: the block physically after the merged span must reflect that
        // its predecessor is now this one free block.
        let after = start + size;
        self.publish_left_neighbor(after, false, size == 16);

        self.free_lists.insert(class_of(size), &mut self.buffer, start);
        start
    }

    /// Unlink a free block from its current free list, ahead of it being
    /// absorbed into a coalesced span.
    fn unlink(&mut self, block: usize) {
        let size = self.buffer.header(block).size();
        self.free_lists.remove(class_of(size), &mut self.buffer, block);
    }

    /// Rewrite `block`'s `prev_alloc`/`prev_mini` flags in place, leaving
    /// its size and `alloc` bit untouched.
    ///
    /// By invariant I5 the block this is called on is always allocated (or
    /// the epilogue): a free block can never be adjacent to another free
    /// one, so there is never a footer to keep in sync here.
    pub(crate) fn publish_left_neighbor(&mut self, block: usize, prev_alloc: bool, prev_mini: bool) {
        let header = self.buffer.header(block);
        let updated = Word::pack(header.size(), header.alloc(), prev_alloc, prev_mini);
        self.buffer.set_header(block, updated);
    }
}
