//! End-to-end dispatch: signature parsing, strategy selection, marshaling,
//! and calls through a real shared library.

#![cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]

use std::ffi::{c_char, CStr};

use dynabi::{bind, register, Arg, CallError, Ret, Signature, Strategy};

extern "C" fn add3(a: i64, b: i64, c: i64) -> i64 {
    a + b + c
}

extern "C" fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

extern "C" fn text_len(p: *const c_char) -> i64 {
    unsafe { CStr::from_ptr(p) }.to_bytes().len() as i64
}

#[allow(clippy::too_many_arguments)]
extern "C" fn sum9(
    a: i64,
    b: i64,
    c: i64,
    d: i64,
    e: i64,
    f: i64,
    g: i64,
    h: i64,
    i: i64,
) -> i64 {
    a + b + c + d + e + f + g + h + i
}

extern "C" fn weighted(a: i64, w: f64, b: i64) -> f64 {
    (a as f64) * w + b as f64
}

fn fn_addr(f: usize) -> u64 {
    f as u64
}

#[test]
fn test_typed_strategy_for_word_signature() {
    let sig = Signature::parse("(i64, i64, i64) -> i64").unwrap();
    let f = bind(&sig, fn_addr(add3 as usize)).unwrap();
    assert_eq!(f.strategy(), Strategy::Typed);
    let r = f.call(&[Arg::I64(1), Arg::I64(2), Arg::I64(3)]).unwrap();
    assert_eq!(r, Ret::I64(6));
}

#[test]
fn test_float_strategy_for_double_signature() {
    let sig = Signature::parse("(f64) -> f64").unwrap();
    let f = bind(&sig, fn_addr(clamp01 as usize)).unwrap();
    assert_eq!(f.strategy(), Strategy::Float);
    assert_eq!(f.call(&[Arg::F64(7.0)]).unwrap(), Ret::F64(1.0));
}

#[test]
fn test_cstring_strategy_for_single_string() {
    let sig = Signature::parse("(str) -> i64").unwrap();
    let f = bind(&sig, fn_addr(text_len as usize)).unwrap();
    assert_eq!(f.strategy(), Strategy::CString);
    assert_eq!(f.call(&[Arg::Str("hello")]).unwrap(), Ret::I64(5));
}

#[test]
fn test_generic_strategy_for_nine_words() {
    let sig =
        Signature::parse("(i64, i64, i64, i64, i64, i64, i64, i64, i64) -> i64").unwrap();
    let f = bind(&sig, fn_addr(sum9 as usize)).unwrap();
    assert_eq!(f.strategy(), Strategy::Generic);
    let args: Vec<Arg> = (1..=9).map(Arg::I64).collect();
    assert_eq!(f.call(&args).unwrap(), Ret::I64(45));
}

#[test]
fn test_generic_strategy_for_mixed_kinds() {
    let sig = Signature::parse("(i64, f64, i64) -> f64").unwrap();
    let f = bind(&sig, fn_addr(weighted as usize)).unwrap();
    assert_eq!(f.strategy(), Strategy::Generic);
    let r = f
        .call(&[Arg::I64(10), Arg::F64(0.5), Arg::I64(3)])
        .unwrap();
    assert_eq!(r, Ret::F64(8.0));
}

#[test]
fn test_call_errors_are_recoverable() {
    let sig = Signature::parse("(i64, i64, i64) -> i64").unwrap();
    let f = bind(&sig, fn_addr(add3 as usize)).unwrap();
    assert!(matches!(
        f.call(&[Arg::I64(1)]),
        Err(CallError::ArityMismatch { expected: 3, got: 1 })
    ));
    assert!(matches!(
        f.call(&[Arg::F64(1.0), Arg::I64(2), Arg::I64(3)]),
        Err(CallError::KindMismatch { index: 0, .. })
    ));
    // The handle still works after a rejected call.
    assert_eq!(
        f.call(&[Arg::I64(1), Arg::I64(2), Arg::I64(3)]).unwrap(),
        Ret::I64(6)
    );
}

extern "C" fn ptr_plus(p: *const u8, off: i64) -> i64 {
    p as i64 + off
}

#[test]
fn test_pointer_argument_with_caller_owned_storage() {
    let sig = Signature::parse("(ptr, i64) -> i64").unwrap();
    let f = bind(&sig, fn_addr(ptr_plus as usize)).unwrap();
    let storage = vec![0u8; 32];
    let p = storage.as_ptr();
    let r = f
        .call(&[Arg::Ptr(p as *const _), Arg::I64(5)])
        .unwrap();
    assert_eq!(r, Ret::I64(p as i64 + 5));
    drop(storage);
}

#[test]
fn test_register_declines_unbindable_signature() {
    let sig = Signature::parse("(gadget) -> i64").unwrap();
    let mut slot = None;
    assert!(!register(&mut slot, &sig, fn_addr(add3 as usize)));
    assert!(slot.is_none());
}

#[cfg(target_os = "linux")]
mod libm {
    use super::*;
    use dynabi::{register_symbol, NativeLibrary};

    #[test]
    fn test_bind_cos_from_shared_library() {
        let libm = NativeLibrary::open("libm.so.6").unwrap();
        let sig = Signature::parse("(f64) -> f64").unwrap();
        let cos = bind(&sig, libm.symbol_addr("cos").unwrap()).unwrap();
        let r = cos.call(&[Arg::F64(0.0)]).unwrap();
        assert_eq!(r.as_f64(), Some(1.0));
    }

    #[test]
    fn test_register_symbol_convenience() {
        let libm = NativeLibrary::open("libm.so.6").unwrap();
        let sig = Signature::parse("(f64, f64) -> f64").unwrap();
        let mut slot = None;
        assert!(register_symbol(&mut slot, &libm, "fmax", &sig).unwrap());
        let fmax = slot.unwrap();
        let r = fmax.call(&[Arg::F64(1.0), Arg::F64(2.0)]).unwrap();
        assert_eq!(r, Ret::F64(2.0));
        assert!(matches!(
            register_symbol(&mut None, &libm, "no_such_symbol", &sig),
            Err(dynabi::LoadError::Symbol { .. })
        ));
    }
}
