#[test]
fn is_usable_in_const_contexts() {
    const _ALLOCATOR1: seglloc::Allocator<96> = seglloc::Allocator::new();
    static _ALLOCATOR2: seglloc::Allocator<96> = seglloc::Allocator::new();
}

#[test]
fn supports_global_alloc() {
    fn assert<T: core::alloc::GlobalAlloc>(_: T) {}
    assert(seglloc::Allocator::<96>::new())
}

#[test]
#[should_panic(expected = "too small heap memory")]
fn min_heap_size_of_at_least_80() {
    let _allocator = seglloc::Allocator::<16>::new(); // panic here
}

#[test]
#[should_panic(expected = "divisible by 16")]
fn heap_size_must_be_a_multiple_of_16() {
    let _allocator = seglloc::Allocator::<90>::new(); // panic here
}

#[test]
fn oom_request_returns_null_instead_of_panicking() {
    use core::alloc::{GlobalAlloc, Layout};

    let allocator = seglloc::Allocator::<96>::new();
    let layout = Layout::from_size_align(1_000_000, 1).unwrap();
    // SAFETY: a nonzero-size layout is always valid to pass to `alloc`.
    let ptr = unsafe { allocator.alloc(layout) };
    assert!(ptr.is_null());
}
