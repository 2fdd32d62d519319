#![feature(test)]
extern crate test;
use test::Bencher;

use std::alloc::{GlobalAlloc as _, Layout};

mod repeated_allocation_deallocation {
    use super::*;

    /// Run a benchmark, which repeatedly allocates and deallocates the same
    /// block. The benchmark will allocate the given amount of blocks beforehand
    /// (before running the actual benchmark) in order to fill up the heap with
    /// unrelated allocations.
    ///
    /// # Panics
    /// This will panic, if the requested pre-allocations will fill up the whole
    /// heap (so the actual benchmark cannot allocate blocks anymore).
    fn benchmark_with_preallocation(b: &mut Bencher, pre_allocations: usize) {
        let allocator = seglloc::Allocator::<8192>::new();
        // pre-allocate much memory to see the real impact of free-list lookup
        for _ in 0..pre_allocations {
            unsafe { allocator.alloc(Layout::new::<u8>()) };
        }

        let layout = Layout::new::<u8>();

        // make sure, that there is enough room for the next allocation
        let ptr = unsafe { allocator.alloc(layout) };
        assert_ne!(ptr, std::ptr::null_mut::<u8>());
        unsafe { allocator.dealloc(ptr, layout) };

        // run actual benchmark: allocate & deallocate the same block repeatedly
        b.iter(|| {
            let ptr = unsafe { allocator.alloc(layout) };
            let ptr = test::black_box(ptr);
            unsafe { allocator.dealloc(ptr, layout) };
        });
    }

    #[bench]
    fn no_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 0);
    }

    #[bench]
    fn low_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 8);
    }

    #[bench]
    fn medium_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 510);
    }

    #[bench]
    fn high_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 1020);
    }
}

/// Benchmarks that deliberately fragment the heap across several size
/// classes before measuring, since the segregated-list design's cost is
/// dominated by free-list walks rather than a flat scan of the whole heap.
mod fragmented_heap {
    use super::*;

    /// Allocate blocks of `sizes`, round-robin, then free every other one so
    /// the free lists for those classes each end up with several entries.
    fn fragment(allocator: &seglloc::Allocator<16384>, sizes: &[usize], rounds: usize) -> Vec<*mut u8> {
        let mut live = Vec::new();
        for round in 0..rounds {
            for &size in sizes {
                let layout = Layout::from_size_align(size, 8).unwrap();
                let ptr = unsafe { allocator.alloc(layout) };
                assert_ne!(ptr, std::ptr::null_mut::<u8>());
                live.push((ptr, layout));
            }
            if round % 2 == 1 {
                for (ptr, layout) in live.drain(..).step_by(2).collect::<Vec<_>>() {
                    unsafe { allocator.dealloc(ptr, layout) };
                }
            }
        }
        live.into_iter().map(|(ptr, _)| ptr).collect()
    }

    #[bench]
    fn allocate_into_multiple_size_classes(b: &mut Bencher) {
        let allocator = seglloc::Allocator::<16384>::new();
        let sizes = [8usize, 40, 100, 300, 900];
        fragment(&allocator, &sizes, 4);

        let layout = Layout::from_size_align(64, 8).unwrap();
        b.iter(|| {
            let ptr = unsafe { allocator.alloc(layout) };
            let ptr = test::black_box(ptr);
            unsafe { allocator.dealloc(ptr, layout) };
        });
    }

    #[bench]
    fn find_fit_under_bounded_search(b: &mut Bencher) {
        // many same-class free blocks, forcing find_fit to walk its
        // MAX_SEARCH-bounded window on every call instead of an early exit.
        let allocator = seglloc::Allocator::<16384>::new();
        let layout = Layout::from_size_align(256, 8).unwrap();
        let mut live = Vec::new();
        for _ in 0..20 {
            let ptr = unsafe { allocator.alloc(layout) };
            live.push(ptr);
        }
        for ptr in live.drain(..) {
            unsafe { allocator.dealloc(ptr, layout) };
        }

        b.iter(|| {
            let ptr = unsafe { allocator.alloc(layout) };
            let ptr = test::black_box(ptr);
            unsafe { allocator.dealloc(ptr, layout) };
        });
    }
}
