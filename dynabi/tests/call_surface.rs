//! Exercises the raw fixed-arity and variadic primitives against local
//! C-ABI callees.

#![cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]

use dynabi::FramePool;

extern "C" fn nullary() -> u64 {
    7
}

extern "C" fn add2(a: u64, b: u64) -> u64 {
    a + b
}

extern "C" fn sum5(a: u64, b: u64, c: u64, d: u64, e: u64) -> u64 {
    a + b + c + d + e
}

#[allow(clippy::too_many_arguments)]
extern "C" fn sum9(
    a: u64,
    b: u64,
    c: u64,
    d: u64,
    e: u64,
    f: u64,
    g: u64,
    h: u64,
    i: u64,
) -> u64 {
    a + b + c + d + e + f + g + h + i
}

#[allow(clippy::too_many_arguments)]
extern "C" fn sum15(
    a: u64,
    b: u64,
    c: u64,
    d: u64,
    e: u64,
    f: u64,
    g: u64,
    h: u64,
    i: u64,
    j: u64,
    k: u64,
    l: u64,
    m: u64,
    n: u64,
    o: u64,
) -> u64 {
    a + b + c + d + e + f + g + h + i + j + k + l + m + n + o
}

extern "C" fn negate_f32(x: f32) -> f32 {
    -x
}

extern "C" fn mul3_f64(a: f64, b: f64, c: f64) -> f64 {
    a * b * c
}

extern "C" fn sum_slice(p: *const i64, n: usize) -> i64 {
    let mut total = 0;
    for i in 0..n {
        total += unsafe { *p.add(i) };
    }
    total
}

#[repr(C)]
struct Pair {
    lo: u64,
    hi: u64,
}

extern "C" fn make_pair(lo: u64, hi: u64) -> Pair {
    Pair { lo, hi }
}

fn addr(f: usize) -> u64 {
    f as u64
}

#[test]
fn test_fixed_arity_spread() {
    unsafe {
        assert_eq!(dynabi::call0(addr(nullary as usize)), 7);
        assert_eq!(dynabi::call2(addr(add2 as usize), 40, 2), 42);
        assert_eq!(dynabi::call5(addr(sum5 as usize), 1, 2, 3, 4, 5), 15);
        assert_eq!(
            dynabi::call9(addr(sum9 as usize), 1, 2, 3, 4, 5, 6, 7, 8, 9),
            45
        );
        assert_eq!(
            dynabi::call15(
                addr(sum15 as usize),
                1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15
            ),
            120
        );
    }
}

#[test]
fn test_surplus_slots_are_harmless() {
    // The callee declares two parameters; the primitive populates two
    // slots and the trampoline still materializes the full register image.
    let r = unsafe { dynabi::call2(addr(add2 as usize), 1, 2) };
    assert_eq!(r, 3);
}

#[test]
fn test_variadic_matches_fixed() {
    let args: Vec<u64> = (1..=9).collect();
    let (r, _) = unsafe { dynabi::call_n(addr(sum9 as usize), &args) };
    assert_eq!(r, 45);
}

#[test]
fn test_variadic_exposes_auxiliary_register() {
    let (lo, hi) = unsafe { dynabi::call_n(addr(make_pair as usize), &[0xdead, 0xbeef]) };
    assert_eq!(lo, 0xdead);
    assert_eq!(hi, 0xbeef);
}

#[test]
fn test_float_families_round_trip_bits() {
    let r = unsafe { dynabi::call_float1(addr(negate_f32 as usize), 1.5f32) };
    assert_eq!(r, -1.5f32);
    let r = unsafe { dynabi::call_double3(addr(mul3_f64 as usize), 2.0, 3.0, 4.0) };
    assert_eq!(r, 24.0);
}

#[test]
fn test_pointer_argument_with_caller_owned_buffer() {
    let data: Vec<i64> = vec![3, 5, 7];
    let r = unsafe {
        dynabi::call2(
            addr(sum_slice as usize),
            data.as_ptr() as u64,
            data.len() as u64,
        )
    };
    assert_eq!(r, 15);
    drop(data);
}

#[test]
fn test_pool_stays_bounded_under_repeated_calls() {
    for _ in 0..1000 {
        let r = unsafe { dynabi::call2(addr(add2 as usize), 1, 1) };
        assert_eq!(r, 2);
    }
    // One frame per concurrently running call; sequential reuse must not
    // grow the free list without bound.
    assert!(FramePool::global().idle() <= 64);
}

#[test]
#[should_panic(expected = "function address is null")]
fn test_null_address_panics() {
    let _ = unsafe { dynabi::call0(0) };
}

#[test]
#[should_panic(expected = "exceed")]
fn test_variadic_over_capacity_panics() {
    let args = [0u64; 16];
    let _ = unsafe { dynabi::call_n(addr(nullary as usize), &args) };
}
