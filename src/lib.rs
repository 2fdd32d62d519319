//! Segregated free-list allocator for embedded systems
//!
//! This crate provides a single type called [`Allocator`]. This type implements
//! the [`core::alloc::GlobalAlloc`]-trait, which is required to use the
//! [`alloc`-crate][alloc] on `#![no_std]`-targets. Unlike a simple linear-scan
//! allocator, this one keeps a free list per size class and merges adjacent
//! free blocks via boundary tags, so long-running programs that allocate and
//! free a mix of sizes don't pay for a full heap scan on every call.
//!
//! # Usage
//! The usage is simple: just copy and paste the following code snipped into
//! your binary crate and potentially adjust the number of bytes of the heap
//! (here 4K):
//! ```no_run
//! #[global_allocator]
//! static ALLOCATOR: seglloc::Allocator<4096> = seglloc::Allocator::new();
//!
//! extern crate alloc;
//! ```
//! Afterwards you don't need to interact with the crate or the variable
//! `ALLOCATOR` anymore. Now you can just `use alloc::vec::Vec` or even
//! `use alloc::collections::BTreeMap`, i.e. every fancy collection which is
//! normally provided by `std`.
//!
//! The minimal buffer size is `80` bytes: two sentinel words, the first
//! 64-byte heap extension, and the epilogue word that follows it. Adjust the
//! size as necessary, e.g. by doing a worst case calculation and potentially
//! adding some backup space of 10% (for example).
//!
//! Note to users with things like `MPU`s, `MMU`s, etc.: your device might
//! support things like memory remapping or memory protection with setting
//! read/write/execution rights. This crate _doesn't use_ those features at all!
//! If that is desired, you should take the address of the buffer and use that
//! along with the known size `N` to protect the heap memory. To users with a
//! fully-working MMU: it is recommended, that you use an allocator, that
//! actually supports paging, etc. This crate might still be helpful, e.g.
//! before setting up the MMU.
//!
//! # Implementation
//! Every block in the heap carries a header word (and, for free blocks of at
//! least 32 bytes, a matching footer word) encoding its size and three status
//! bits: whether it's allocated, whether its physical predecessor is
//! allocated, and whether that predecessor is a 16-byte "mini" block. Fifteen
//! free lists, one per size class, index the free blocks; the smallest class
//! (exactly 16 bytes) is singly-linked since a mini block's 8-byte payload
//! has no room for a `prev` pointer, and the rest are doubly-linked for O(1)
//! removal from anywhere in the list.
//!
//! 1.  The heap starts out uninitialized. The first allocation lazily writes
//!     the prologue and epilogue sentinels and extends the heap by an initial
//!     64 bytes, all of it one free block.
//! 2.  Allocating rounds the request up to a 16-byte block size (with room
//!     for the header), searches the matching free list and the ones above
//!     it for a block at least that big - stopping after six candidates in
//!     whichever class finds one, rather than scanning the whole list for
//!     the true best fit - and splits off a free remainder if one of at
//!     least 16 bytes is left over.
//! 3.  Freeing a block flips its allocated bit and immediately coalesces it
//!     with any free physical neighbor, left or right, updating whichever
//!     free lists are affected and re-publishing the boundary flags of the
//!     block that ends up after the merged span.
//! 4.  If no free block is big enough, the heap is extended by at least the
//!     request (or 64 bytes, whichever is larger) and the new space is
//!     coalesced with whatever free block, if any, used to sit at the end of
//!     the heap. Extending past the buffer's capacity fails the allocation.
//!
//! Reallocation never grows a block in place: it always allocates fresh,
//! copies the smaller of the old and new sizes, and frees the original.
//!
//! [alloc]: https://doc.rust-lang.org/alloc/index.html
#![no_std]

mod raw_allocator;

use core::alloc::{GlobalAlloc, Layout};
use raw_allocator::RawAllocator;
use spin::Mutex;

/// The memory allocator for embedded systems.
///
/// This is the core type of this crate: it is an allocator with a predefined
/// heap size. Therefore the heap memory usage is statically limited to an upper
/// value, which also helps to prevent issues with heap/stack-smashes, as the
/// heap is counted to the static memory (e.g. `.data`/`.bss`-sections). Such a
/// smash might still happen though, if the stack pointer grows into the heap,
/// but the heap cannot grow into the stack pointer.
///
/// Its usage is simple: just copy and paste the following in the binary crate
/// you're developing. The memory size of the heap is `4096` or 4K in this
/// example. Adjust that value to your needs.
/// ```no_run
/// #[global_allocator]
/// static ALLOCATOR: seglloc::Allocator<4096> = seglloc::Allocator::new();
/// ```
/// Also please refer to the [crate-level](crate)-documentation for
/// recommendations on the buffer size and general usage.
///
/// All payloads returned by this allocator are 16-byte aligned. Requests for
/// a stricter alignment than that are not supported; in debug builds they
/// are caught by an assertion rather than silently returning misaligned
/// memory.
pub struct Allocator<const N: usize>(Mutex<RawAllocator<N>>);
impl<const N: usize> Allocator<N> {
    /// Create a new [`Allocator`].
    ///
    /// This function is a `const fn`, therefore you can call it directly when
    /// creating the allocator. The heap itself is not touched until the first
    /// allocation request.
    ///
    /// Please see the [crate-level](crate)-documentation for recommendations on
    /// the buffer size and general usage.
    ///
    /// # Panics
    /// This function will panic, if the supplied buffer size, i.e. `N` is less
    /// than `80` or not divisible by `16`.
    #[must_use = "assign the allocator to a static variable and apply the `#[global_allocator]`-attribute to make it the global allocator"]
    pub const fn new() -> Self {
        Self(Mutex::new(RawAllocator::new()))
    }
}
impl<const N: usize> Default for Allocator<N> {
    fn default() -> Self {
        Self::new()
    }
}
unsafe impl<const N: usize> GlobalAlloc for Allocator<N> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        debug_assert!(
            layout.align() <= 16,
            "seglloc only guarantees 16-byte alignment"
        );
        let mut engine = self.0.lock();
        match engine.alloc(layout.size()) {
            Some(payload) => engine.base_ptr().wrapping_add(payload),
            None => core::ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        let mut engine = self.0.lock();
        let offset = engine.offset_of(ptr);
        engine.free(offset);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        debug_assert!(
            layout.align() <= 16,
            "seglloc only guarantees 16-byte alignment"
        );
        let mut engine = self.0.lock();
        let offset = engine.offset_of(ptr);
        match engine.realloc(offset, new_size) {
            Some(payload) => engine.base_ptr().wrapping_add(payload),
            None => core::ptr::null_mut(),
        }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        debug_assert!(
            layout.align() <= 16,
            "seglloc only guarantees 16-byte alignment"
        );
        let mut engine = self.0.lock();
        match engine.zero_alloc(1, layout.size()) {
            Some(payload) => engine.base_ptr().wrapping_add(payload),
            None => core::ptr::null_mut(),
        }
    }
}
