//! The debug-only heap consistency checker.
//!
//! Walks the heap twice: once physically, block by block, to verify the
//! boundary-tag invariants and tally up the free blocks found there; once
//! through the free lists, to verify list well-formedness and tally the
//! same things from that side. The two tallies must then agree - this is
//! the cross-check that catches a free list silently drifting out of sync
//! with the heap it's supposed to index.
//!
//! Only ever called from tests and `debug_assert!`s; it is never part of
//! the hot allocation path.

use super::free_list::{class_of, NUM_CLASSES};
use super::RawAllocator;

impl<const N: usize> RawAllocator<N> {
    /// Verify every boundary-tag and free-list invariant, returning whether
    /// the heap is internally consistent.
    ///
    /// `line_tag` identifies the call site for callers that want to log
    /// which check failed; this implementation only returns a bool, leaving
    /// what to do with a `false` result to the caller.
    #[allow(dead_code)]
    pub(crate) fn check(&self, line_tag: u32) -> bool {
        let _ = line_tag;
        if !self.initialized {
            return true;
        }

        let (heap_free_blocks, heap_free_size) = match self.check_heap_walk() {
            Some(tally) => tally,
            None => return false,
        };
        let (list_free_blocks, list_free_size) = match self.check_free_lists() {
            Some(tally) => tally,
            None => return false,
        };

        // I6/I7 cross-check: the two independent tallies must agree. Uses OR,
        // not AND, so that either figure disagreeing fails the check - an
        // allocator that drops a free block from its list but leaves the
        // heap's own count unaffected must not slip past this as "fine".
        if heap_free_blocks != list_free_blocks || heap_free_size != list_free_size {
            return false;
        }
        true
    }

    /// Walk the heap physically from the first block to the epilogue,
    /// checking I1-I5 at each step. Returns `(free_blocks, free_bytes)`.
    fn check_heap_walk(&self) -> Option<(usize, usize)> {
        let mut block = self.buffer.heap_low();
        let mut free_blocks = 0usize;
        let mut free_size = 0usize;
        let mut prev_was_free = false;

        loop {
            let header = self.buffer.header(block);

            // I1: every block is 16-byte aligned and sized a multiple of 16.
            if block % 16 != 0 || header.size() % 16 != 0 {
                return None;
            }

            if header.size() == 0 {
                // the epilogue: must be marked allocated (I2).
                if !header.alloc() {
                    return None;
                }
                break;
            }

            // I3: prev_alloc/prev_mini must agree with the actual predecessor,
            // except for the first block, whose predecessor is the prologue.
            if block != self.buffer.heap_low() {
                let prev = self.buffer.prev_in_heap(block);
                let prev_header = self.buffer.header(prev);
                if header.prev_alloc() != prev_header.alloc() {
                    return None;
                }
                if header.prev_mini() != (prev_header.size() == 16) {
                    return None;
                }
            }

            if !header.alloc() {
                // I4: a free standard block's footer must mirror its header.
                if header.size() >= 32 {
                    let footer_offset = self.buffer.footer_offset(block);
                    let footer = super::word::Word::from_bits(self.buffer.read_word(footer_offset));
                    if footer != header {
                        return None;
                    }
                }
                // I5: no two physically-adjacent blocks are both free.
                if prev_was_free {
                    return None;
                }
                free_blocks += 1;
                free_size += header.size();
            }
            prev_was_free = !header.alloc();

            block = self.buffer.next_in_heap(block);
            if block > self.buffer.heap_high() + 1 {
                return None;
            }
        }

        Some((free_blocks, free_size))
    }

    /// Walk every free list, checking I6 (class membership) and I7 (link
    /// well-formedness). Returns `(free_blocks, free_bytes)`.
    fn check_free_lists(&self) -> Option<(usize, usize)> {
        let mut free_blocks = 0usize;
        let mut free_size = 0usize;

        for class in 0..NUM_CLASSES {
            let mut cursor = self.free_lists.head(class);
            let mut prev_offset = 0u64;

            while let Some(offset) = cursor {
                let header = self.buffer.header(offset);

                // I6: every block must actually be free and belong in the
                // class its list head places it in.
                if header.alloc() || class_of(header.size()) != class {
                    return None;
                }

                // I7: a standard (non-mini) list's prev link must point back
                // to where we came from.
                if class != 0 && self.buffer.prev_link(offset) != prev_offset {
                    return None;
                }

                free_blocks += 1;
                free_size += header.size();

                prev_offset = offset as u64;
                cursor = match self.buffer.next_link(offset) {
                    0 => None,
                    next => Some(next as usize),
                };
            }
        }

        Some((free_blocks, free_size))
    }
}
