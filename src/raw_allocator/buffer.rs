//! The byte buffer backing the heap, and the concrete page provider.
//!
//! This crate is `#![no_std]` leaf plumbing with no operating system to page
//! memory from, so the "abstract page provider" is realized here as a
//! fixed-capacity array of `N` bytes together with a high-water mark: growing
//! the heap just means advancing that mark, and running out of capacity is
//! the provider's failure sentinel. Everything above this module addresses
//! the heap purely in terms of byte offsets into this buffer, never as raw
//! pointers; that keeps the whole engine free of `unsafe` except for the
//! handful of reads/writes in this file.

use super::word::WORD_SIZE;
use core::mem::MaybeUninit;

/// The minimum buffer size: large enough to hold a prologue and an epilogue
/// word, with nothing in between.
pub(crate) const MIN_BUFFER_SIZE: usize = 2 * WORD_SIZE;

/// Array of bytes, aligned to 16 so that the first payload byte after the
/// 8-byte prologue word is always 16-byte aligned (the alignment guarantee
/// of the whole crate, see [`crate::Allocator`]).
#[repr(align(16))]
struct Storage<const N: usize>([MaybeUninit<u8>; N]);

/// The fixed-capacity byte region backing a [`RawAllocator`](super::RawAllocator).
///
/// Bytes are only ever read after this module itself has written them
/// (sentinels on init, headers/footers/links on every mutation), so plain
/// `u64` reads/writes are used directly instead of threading `MaybeUninit`
/// through the rest of the engine.
pub(crate) struct Buffer<const N: usize> {
    storage: Storage<N>,
    /// One byte past the current epilogue word; `0` before the heap has been
    /// initialized.
    pub(crate) heap_end: usize,
}
impl<const N: usize> Buffer<N> {
    /// Create a new, uninitialized buffer.
    ///
    /// # Panics
    /// Panics if `N` is smaller than [`MIN_BUFFER_SIZE`] or not a multiple of
    /// 16.
    pub(crate) const fn new() -> Self {
        assert!(N >= MIN_BUFFER_SIZE, "buffer too small, use N >= 16");
        assert!(N % 16 == 0, "buffer size must be a multiple of 16");
        Self {
            storage: Storage([MaybeUninit::uninit(); N]),
            heap_end: 0,
        }
    }

    /// The total capacity of the buffer, i.e. the ceiling the page provider
    /// refuses to grow past.
    pub(crate) const fn capacity(&self) -> usize {
        N
    }

    /// The lowest valid block offset: right after the prologue word.
    ///
    /// Only meaningful (and only used) by the consistency checker.
    pub(crate) const fn heap_low(&self) -> usize {
        WORD_SIZE
    }

    /// The highest valid byte offset currently in the heap, inclusive.
    ///
    /// Only meaningful (and only used) by the consistency checker.
    pub(crate) fn heap_high(&self) -> usize {
        self.heap_end.saturating_sub(1)
    }

    /// Read a raw 8-byte word at a byte offset.
    ///
    /// # Panics
    /// Panics (debug builds only) if `offset` is not word-aligned or would
    /// read past the buffer.
    pub(crate) fn read_word(&self, offset: usize) -> u64 {
        debug_assert!(offset % WORD_SIZE == 0, "unaligned word read at {offset}");
        debug_assert!(offset + WORD_SIZE <= N, "word read out of bounds at {offset}");
        // SAFETY: the offset is word-aligned (checked above) and the buffer
        // itself is aligned to 16 (a stricter alignment than `u64` needs), so
        // the resulting pointer is valid for a `u64` read. The bytes read
        // were previously written by `write_word`, since every offset this
        // module is asked to read is one it (or `RawAllocator`) wrote first.
        unsafe {
            let ptr = self.storage.0.as_ptr().add(offset).cast::<u64>();
            ptr.read()
        }
    }

    /// Write a raw 8-byte word at a byte offset.
    ///
    /// # Panics
    /// Panics (debug builds only) if `offset` is not word-aligned or would
    /// write past the buffer.
    pub(crate) fn write_word(&mut self, offset: usize, value: u64) {
        debug_assert!(offset % WORD_SIZE == 0, "unaligned word write at {offset}");
        debug_assert!(offset + WORD_SIZE <= N, "word write out of bounds at {offset}");
        // SAFETY: see `read_word`.
        unsafe {
            let ptr = self.storage.0.as_mut_ptr().add(offset).cast::<u64>();
            ptr.write(value);
        }
    }

    /// The address of the first byte of the buffer.
    pub(crate) fn base_ptr(&mut self) -> *mut u8 {
        self.storage.0.as_mut_ptr().cast()
    }

    /// The byte offset of `ptr` within this buffer.
    ///
    /// `ptr` is trusted to actually point inside the buffer; pointers from
    /// outside the allocator are undefined behavior, not a recoverable
    /// error, so this is not checked.
    pub(crate) fn offset_of(&self, ptr: *mut u8) -> usize {
        let base = self.storage.0.as_ptr() as usize;
        ptr as usize - base
    }

    /// Copy `len` bytes from `src` to `dst`. The two ranges are never
    /// overlapping in practice: `src` is always a still-allocated block and
    /// `dst` a freshly-allocated, disjoint one.
    pub(crate) fn copy_bytes(&mut self, src: usize, dst: usize, len: usize) {
        let base = self.base_ptr();
        // SAFETY: both offsets are within the buffer (callers only ever pass
        // payload offsets of live blocks) and the two spans don't overlap.
        unsafe {
            let src_ptr = base.add(src);
            let dst_ptr = base.add(dst);
            core::ptr::copy_nonoverlapping(src_ptr, dst_ptr, len);
        }
    }

    /// Zero `len` bytes starting at `offset`.
    pub(crate) fn zero_bytes(&mut self, offset: usize, len: usize) {
        let base = self.base_ptr();
        // SAFETY: `offset..offset + len` is within the buffer; callers only
        // ever pass the payload span of a block they just allocated.
        unsafe {
            core::ptr::write_bytes(base.add(offset), 0, len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Buffer;

    #[test]
    fn fresh_buffer_is_uninitialized() {
        let buffer = Buffer::<32>::new();
        assert_eq!(buffer.heap_end, 0);
        assert_eq!(buffer.capacity(), 32);
    }

    #[test]
    fn word_round_trips_through_storage() {
        let mut buffer = Buffer::<32>::new();
        buffer.write_word(8, 0xDEAD_BEEF);
        assert_eq!(buffer.read_word(8), 0xDEAD_BEEF);
    }

    #[test]
    fn offset_of_matches_base_ptr_arithmetic() {
        let mut buffer = Buffer::<32>::new();
        let base = buffer.base_ptr();
        // SAFETY: 8 is within the 32-byte buffer.
        let ptr = unsafe { base.add(8) };
        assert_eq!(buffer.offset_of(ptr), 8);
    }

    #[test]
    fn copy_bytes_moves_payload() {
        let mut buffer = Buffer::<32>::new();
        buffer.write_word(0, 0x0102_0304_0506_0708);
        buffer.copy_bytes(0, 16, 8);
        assert_eq!(buffer.read_word(16), 0x0102_0304_0506_0708);
    }

    #[test]
    fn zero_bytes_clears_payload() {
        let mut buffer = Buffer::<32>::new();
        buffer.write_word(0, u64::MAX);
        buffer.zero_bytes(0, 8);
        assert_eq!(buffer.read_word(0), 0);
    }
}
