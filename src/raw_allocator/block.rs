//! Navigation between a block, its payload, its footer, and its physical
//! neighbors in the heap.
//!
//! This is the layer that turns the bit-packed [`Word`]s of the previous
//! module into the heap's implicit block structure: given the offset of a
//! block's header, where is its payload, its footer (if it has one), the
//! block physically before it, the block physically after it?

use super::buffer::Buffer;
use super::word::{Word, WORD_SIZE};

impl<const N: usize> Buffer<N> {
    /// Read the header word of the block at `block`.
    pub(crate) fn header(&self, block: usize) -> Word {
        Word::from_bits(self.read_word(block))
    }

    /// Overwrite the header word of the block at `block`.
    pub(crate) fn set_header(&mut self, block: usize, word: Word) {
        self.write_word(block, word.to_bits());
    }

    /// Overwrite the footer word of the block at `block`, using `word`'s
    /// size to locate it.
    ///
    /// Only meaningful for free standard blocks (size >= 32); mini blocks
    /// and allocated blocks have no footer, callers must not call this for
    /// them.
    pub(crate) fn set_footer(&mut self, block: usize, word: Word) {
        let footer = block + word.size() - WORD_SIZE;
        self.write_word(footer, word.to_bits());
    }

    /// The byte offset of the footer of a free standard block.
    pub(crate) fn footer_offset(&self, block: usize) -> usize {
        block + self.header(block).size() - WORD_SIZE
    }

    /// The byte offset of the payload, one word past the header.
    pub(crate) fn payload_of(block: usize) -> usize {
        block + WORD_SIZE
    }

    /// The byte offset of the block owning a given payload offset.
    pub(crate) fn block_of(payload: usize) -> usize {
        payload - WORD_SIZE
    }

    /// The offset of the block physically following `block`.
    ///
    /// Requires `block`'s size to be nonzero, i.e. `block` must not be the
    /// epilogue.
    pub(crate) fn next_in_heap(&self, block: usize) -> usize {
        let size = self.header(block).size();
        debug_assert!(size > 0, "next_in_heap called on the epilogue");
        block + size
    }

    /// The offset of the block physically preceding `block`.
    ///
    /// Uses `block`'s own `prev_mini` flag to decide whether the predecessor
    /// is a footerless mini block (fixed 16-byte step back) or a standard
    /// block (whose footer, one word before `block`, encodes its size).
    pub(crate) fn prev_in_heap(&self, block: usize) -> usize {
        let header = self.header(block);
        if header.prev_mini() {
            block - 16
        } else {
            let footer = Word::from_bits(self.read_word(block - WORD_SIZE));
            block - footer.size()
        }
    }

    /// Read the `next` link stored in a free block's payload.
    pub(crate) fn next_link(&self, block: usize) -> u64 {
        self.read_word(Self::payload_of(block))
    }

    /// Write the `next` link into a free block's payload.
    pub(crate) fn set_next_link(&mut self, block: usize, value: u64) {
        self.write_word(Self::payload_of(block), value);
    }

    /// Read the `prev` link stored in a free standard block's payload.
    ///
    /// Mini blocks have no `prev` link; callers must not call this for them.
    pub(crate) fn prev_link(&self, block: usize) -> u64 {
        self.read_word(Self::payload_of(block) + WORD_SIZE)
    }

    /// Write the `prev` link into a free standard block's payload.
    pub(crate) fn set_prev_link(&mut self, block: usize, value: u64) {
        self.write_word(Self::payload_of(block) + WORD_SIZE, value);
    }
}
