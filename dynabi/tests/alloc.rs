//! Measures the steady-state heap behavior of the bound call paths: the
//! fixed word path must not allocate once the pool is warm, while the
//! string path is expected to allocate its transient buffer.

#![cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]

use std::alloc::{GlobalAlloc, Layout, System};
use std::ffi::{c_char, CStr};
use std::sync::atomic::{AtomicUsize, Ordering};

use dynabi::{bind, Arg, Ret, Signature, Strategy};

static ALLOCS: AtomicUsize = AtomicUsize::new(0);

struct CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCS.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

extern "C" fn add2(a: i64, b: i64) -> i64 {
    a + b
}

extern "C" fn text_len(p: *const c_char) -> i64 {
    unsafe { CStr::from_ptr(p) }.to_bytes().len() as i64
}

// A single test so no concurrent test bumps the counter mid-measurement.
#[test]
fn test_typed_path_allocation_free_once_warmed() {
    let sig = Signature::parse("(i64, i64) -> i64").unwrap();
    let f = bind(&sig, add2 as usize as u64).unwrap();
    assert_eq!(f.strategy(), Strategy::Typed);

    // Warm: the first calls may fault frames into the pool.
    for _ in 0..8 {
        assert_eq!(f.call(&[Arg::I64(1), Arg::I64(2)]).unwrap(), Ret::I64(3));
    }

    let before = ALLOCS.load(Ordering::Relaxed);
    for _ in 0..1000 {
        assert_eq!(
            f.call(&[Arg::I64(20), Arg::I64(22)]).unwrap(),
            Ret::I64(42)
        );
    }
    assert_eq!(
        ALLOCS.load(Ordering::Relaxed),
        before,
        "warmed word path must not touch the heap"
    );

    // The string path, by contrast, manufactures a buffer per call.
    let sig = Signature::parse("(str) -> i64").unwrap();
    let f = bind(&sig, text_len as usize as u64).unwrap();
    assert_eq!(f.strategy(), Strategy::CString);
    let before = ALLOCS.load(Ordering::Relaxed);
    assert_eq!(f.call(&[Arg::Str("hello")]).unwrap(), Ret::I64(5));
    assert!(ALLOCS.load(Ordering::Relaxed) > before);
}
