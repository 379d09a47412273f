//! Fixed-shape thunk tables: the integer/pointer arms plus the float and
//! single-string specials. Every arm marshals straight into a fixed-arity
//! primitive, so a matched call performs no heap allocation.

use dynabi_call as call;

use crate::pin::Pins;
use crate::registrar::Thunk;
use crate::types::{AbiType, Signature};
use crate::value::{ensure_arity, marshal_word, Arg, CallError, Ret};

fn word_ret(kind: AbiType) -> bool {
    kind.is_word() || kind == AbiType::Void
}

fn expect_f64(arg: &Arg<'_>, index: usize) -> Result<f64, CallError> {
    match arg {
        Arg::F64(v) => Ok(*v),
        _ => Err(CallError::KindMismatch {
            index,
            expected: AbiType::F64,
        }),
    }
}

fn expect_f32(arg: &Arg<'_>, index: usize) -> Result<f32, CallError> {
    match arg {
        Arg::F32(v) => Ok(*v),
        _ => Err(CallError::KindMismatch {
            index,
            expected: AbiType::F32,
        }),
    }
}

macro_rules! word_arm {
    ($sig:expr, $addr:expr, $call:path, $argc:literal: $($idx:expr),*) => {{
        let sig = $sig.clone();
        let addr = $addr;
        Box::new(move |args: &[Arg]| {
            ensure_arity(args, $argc)?;
            let word =
                unsafe { $call(addr $(, marshal_word(&args[$idx], sig.args[$idx], $idx)?)*) };
            Ok(Ret::from_word(sig.ret, word))
        }) as Thunk
    }};
}

macro_rules! double_arm {
    ($addr:expr, $call:path, $argc:literal: $($idx:expr),*) => {{
        let addr = $addr;
        Box::new(move |args: &[Arg]| {
            ensure_arity(args, $argc)?;
            let out = unsafe { $call(addr $(, expect_f64(&args[$idx], $idx)?)*) };
            Ok(Ret::F64(out))
        }) as Thunk
    }};
}

macro_rules! float_arm {
    ($addr:expr, $call:path, $argc:literal: $($idx:expr),*) => {{
        let addr = $addr;
        Box::new(move |args: &[Arg]| {
            ensure_arity(args, $argc)?;
            let out = unsafe { $call(addr $(, expect_f32(&args[$idx], $idx)?)*) };
            Ok(Ret::F32(out))
        }) as Thunk
    }};
}

/// Integer/pointer/boolean arguments, up to eight, word or void return.
pub(crate) fn try_bind_typed(sig: &Signature, addr: u64) -> Option<Thunk> {
    if sig.args.len() > 8 || !sig.args.iter().all(|k| k.is_word()) || !word_ret(sig.ret) {
        return None;
    }
    let thunk = match sig.args.len() {
        0 => word_arm!(sig, addr, call::call0, 0:),
        1 => word_arm!(sig, addr, call::call1, 1: 0),
        2 => word_arm!(sig, addr, call::call2, 2: 0, 1),
        3 => word_arm!(sig, addr, call::call3, 3: 0, 1, 2),
        4 => word_arm!(sig, addr, call::call4, 4: 0, 1, 2, 3),
        5 => word_arm!(sig, addr, call::call5, 5: 0, 1, 2, 3, 4),
        6 => word_arm!(sig, addr, call::call6, 6: 0, 1, 2, 3, 4, 5),
        7 => word_arm!(sig, addr, call::call7, 7: 0, 1, 2, 3, 4, 5, 6),
        8 => word_arm!(sig, addr, call::call8, 8: 0, 1, 2, 3, 4, 5, 6, 7),
        _ => return None,
    };
    Some(thunk)
}

/// Homogeneous float signatures, up to three arguments, matching return.
pub(crate) fn try_bind_float(sig: &Signature, addr: u64) -> Option<Thunk> {
    if sig.args.len() > 3 {
        return None;
    }
    match sig.ret {
        AbiType::F64 if sig.args.iter().all(|k| *k == AbiType::F64) => {
            let thunk = match sig.args.len() {
                0 => double_arm!(addr, call::call_double0, 0:),
                1 => double_arm!(addr, call::call_double1, 1: 0),
                2 => double_arm!(addr, call::call_double2, 2: 0, 1),
                3 => double_arm!(addr, call::call_double3, 3: 0, 1, 2),
                _ => return None,
            };
            Some(thunk)
        }
        AbiType::F32 if sig.args.iter().all(|k| *k == AbiType::F32) => {
            let thunk = match sig.args.len() {
                0 => float_arm!(addr, call::call_float0, 0:),
                1 => float_arm!(addr, call::call_float1, 1: 0),
                2 => float_arm!(addr, call::call_float2, 2: 0, 1),
                3 => float_arm!(addr, call::call_float3, 3: 0, 1, 2),
                _ => return None,
            };
            Some(thunk)
        }
        _ => None,
    }
}

/// The common `(str) -> word` shape. The pinned buffer is released only
/// after the primitive returns.
pub(crate) fn try_bind_string(sig: &Signature, addr: u64) -> Option<Thunk> {
    if sig.args.as_slice() != [AbiType::CStr] || !word_ret(sig.ret) {
        return None;
    }
    let ret = sig.ret;
    Some(Box::new(move |args: &[Arg]| {
        ensure_arity(args, 1)?;
        let s = match &args[0] {
            Arg::Str(s) => *s,
            _ => {
                return Err(CallError::KindMismatch {
                    index: 0,
                    expected: AbiType::CStr,
                })
            }
        };
        let mut pins = Pins::new();
        let p = pins.pin_str(s, 0)?;
        let word = unsafe { call::call1(addr, p as u64) };
        drop(pins);
        Ok(Ret::from_word(ret, word))
    }))
}
