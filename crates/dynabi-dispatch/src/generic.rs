//! Generic fallback path.
//!
//! Builds a per-signature conversion plan once at bind time. Signatures
//! that stay within the register image (fifteen integer words, eight float
//! words) and the closed kind set are accepted; anything with an opaque
//! kind, or too many slots of either class, is declined so the registrar
//! can report the signature as unbindable.
//!
//! Integer-only signatures still route through the fixed-arity primitives,
//! one per arity up to fifteen. Mixed, float-slot, and string signatures
//! populate a pooled frame directly and submit it to the trampoline.

use dynabi_call::{invoke, invoke_f32, invoke_f64};
use dynabi_frame::{FramePool, FLOAT_SLOTS, INT_SLOTS};

use crate::pin::Pins;
use crate::registrar::Thunk;
use crate::types::{AbiType, Signature};
use crate::value::{ensure_arity, marshal_word, Arg, CallError, Ret};

#[derive(Debug, Clone, Copy)]
enum Slot {
    Word(AbiType),
    F32,
    F64,
    Str,
}

#[derive(Debug, Clone, Copy)]
enum RetPlan {
    Word(AbiType),
    F32,
    F64,
}

fn plan(sig: &Signature) -> Option<(Vec<Slot>, RetPlan)> {
    let mut slots = Vec::with_capacity(sig.args.len());
    let mut ints = 0usize;
    let mut floats = 0usize;
    for kind in &sig.args {
        let slot = match *kind {
            k if k.is_word() => {
                ints += 1;
                Slot::Word(k)
            }
            AbiType::F32 => {
                floats += 1;
                Slot::F32
            }
            AbiType::F64 => {
                floats += 1;
                Slot::F64
            }
            AbiType::CStr => {
                ints += 1;
                Slot::Str
            }
            _ => return None,
        };
        slots.push(slot);
    }
    if ints > INT_SLOTS || floats > FLOAT_SLOTS {
        return None;
    }
    let ret = match sig.ret {
        AbiType::F32 => RetPlan::F32,
        AbiType::F64 => RetPlan::F64,
        AbiType::CStr | AbiType::Opaque => return None,
        k => RetPlan::Word(k),
    };
    Some((slots, ret))
}

/// Dispatch a word-only argument list through the matching fixed-arity
/// primitive.
///
/// # Safety
///
/// Same contract as the individual primitives.
unsafe fn call_words(addr: u64, w: &[u64]) -> u64 {
    use dynabi_call as c;
    unsafe {
        match *w {
            [] => c::call0(addr),
            [a] => c::call1(addr, a),
            [a, b] => c::call2(addr, a, b),
            [a, b, cc] => c::call3(addr, a, b, cc),
            [a, b, cc, d] => c::call4(addr, a, b, cc, d),
            [a, b, cc, d, e] => c::call5(addr, a, b, cc, d, e),
            [a, b, cc, d, e, f] => c::call6(addr, a, b, cc, d, e, f),
            [a, b, cc, d, e, f, g] => c::call7(addr, a, b, cc, d, e, f, g),
            [a, b, cc, d, e, f, g, h] => c::call8(addr, a, b, cc, d, e, f, g, h),
            [a, b, cc, d, e, f, g, h, i] => c::call9(addr, a, b, cc, d, e, f, g, h, i),
            [a, b, cc, d, e, f, g, h, i, j] => c::call10(addr, a, b, cc, d, e, f, g, h, i, j),
            [a, b, cc, d, e, f, g, h, i, j, k] => {
                c::call11(addr, a, b, cc, d, e, f, g, h, i, j, k)
            }
            [a, b, cc, d, e, f, g, h, i, j, k, l] => {
                c::call12(addr, a, b, cc, d, e, f, g, h, i, j, k, l)
            }
            [a, b, cc, d, e, f, g, h, i, j, k, l, m] => {
                c::call13(addr, a, b, cc, d, e, f, g, h, i, j, k, l, m)
            }
            [a, b, cc, d, e, f, g, h, i, j, k, l, m, n] => {
                c::call14(addr, a, b, cc, d, e, f, g, h, i, j, k, l, m, n)
            }
            [a, b, cc, d, e, f, g, h, i, j, k, l, m, n, o] => {
                c::call15(addr, a, b, cc, d, e, f, g, h, i, j, k, l, m, n, o)
            }
            _ => c::call_n(addr, w).0,
        }
    }
}

pub(crate) fn try_bind_generic(sig: &Signature, addr: u64) -> Option<Thunk> {
    let (slots, ret) = plan(sig)?;

    let int_only = slots.iter().all(|s| matches!(s, Slot::Word(_)));
    if int_only {
        if let RetPlan::Word(ret_kind) = ret {
            let kinds: Vec<AbiType> = slots
                .iter()
                .map(|s| match s {
                    Slot::Word(k) => *k,
                    _ => unreachable!(),
                })
                .collect();
            return Some(Box::new(move |args: &[Arg]| {
                ensure_arity(args, kinds.len())?;
                let mut words = [0u64; INT_SLOTS];
                for (i, kind) in kinds.iter().enumerate() {
                    words[i] = marshal_word(&args[i], *kind, i)?;
                }
                let word = unsafe { call_words(addr, &words[..kinds.len()]) };
                Ok(Ret::from_word(ret_kind, word))
            }));
        }
    }

    Some(Box::new(move |args: &[Arg]| {
        ensure_arity(args, slots.len())?;
        let mut pins = Pins::new();
        let mut frame = FramePool::global().acquire();
        frame.addr = addr;
        let mut ni = 0;
        let mut nf = 0;
        for (i, slot) in slots.iter().enumerate() {
            match slot {
                Slot::Word(kind) => {
                    frame.ints[ni] = marshal_word(&args[i], *kind, i)?;
                    ni += 1;
                }
                Slot::F32 => {
                    let v = match args[i] {
                        Arg::F32(v) => v,
                        _ => {
                            return Err(CallError::KindMismatch {
                                index: i,
                                expected: AbiType::F32,
                            })
                        }
                    };
                    frame.floats[nf] = u64::from(v.to_bits());
                    nf += 1;
                }
                Slot::F64 => {
                    let v = match args[i] {
                        Arg::F64(v) => v,
                        _ => {
                            return Err(CallError::KindMismatch {
                                index: i,
                                expected: AbiType::F64,
                            })
                        }
                    };
                    frame.floats[nf] = v.to_bits();
                    nf += 1;
                }
                Slot::Str => {
                    let s = match &args[i] {
                        Arg::Str(s) => *s,
                        _ => {
                            return Err(CallError::KindMismatch {
                                index: i,
                                expected: AbiType::CStr,
                            })
                        }
                    };
                    frame.ints[ni] = pins.pin_str(s, i)? as u64;
                    ni += 1;
                }
            }
        }
        let ret_val = match ret {
            RetPlan::Word(kind) => {
                unsafe { invoke(&mut frame) };
                Ret::from_word(kind, frame.ints[0])
            }
            RetPlan::F32 => {
                unsafe { invoke_f32(&mut frame) };
                Ret::F32(f32::from_bits(frame.floats[0] as u32))
            }
            RetPlan::F64 => {
                unsafe { invoke_f64(&mut frame) };
                Ret::F64(f64::from_bits(frame.floats[0]))
            }
        };
        drop(pins);
        Ok(ret_val)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{c_char, CStr};

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

    extern "C" fn scale_sum(a: i64, x: f64, b: i64) -> f64 {
        (a + b) as f64 * x
    }

    extern "C" fn len_plus(extra: i64, p: *const c_char) -> i64 {
        extra + unsafe { CStr::from_ptr(p) }.to_bytes().len() as i64
    }

    #[test]
    fn test_nine_int_args_use_fixed_arity_path() {
        let sig = Signature::parse(
            "(i64, i64, i64, i64, i64, i64, i64, i64, i64) -> i64",
        )
        .unwrap();
        let thunk = try_bind_generic(&sig, sum9 as usize as u64).unwrap();
        let args: Vec<Arg> = (1..=9).map(Arg::I64).collect();
        assert_eq!(thunk(&args).unwrap(), Ret::I64(45));
    }

    #[test]
    fn test_mixed_int_float() {
        let sig = Signature::parse("(i64, f64, i64) -> f64").unwrap();
        let thunk = try_bind_generic(&sig, scale_sum as usize as u64).unwrap();
        let ret = thunk(&[Arg::I64(2), Arg::F64(1.5), Arg::I64(4)]).unwrap();
        assert_eq!(ret, Ret::F64(9.0));
    }

    #[test]
    fn test_string_in_mixed_position() {
        let sig = Signature::parse("(i64, str) -> i64").unwrap();
        let thunk = try_bind_generic(&sig, len_plus as usize as u64).unwrap();
        let ret = thunk(&[Arg::I64(10), Arg::Str("abc")]).unwrap();
        assert_eq!(ret, Ret::I64(13));
    }

    #[test]
    fn test_opaque_kind_declines() {
        let sig = Signature::parse("(gadget) -> i64").unwrap();
        assert!(try_bind_generic(&sig, sum9 as usize as u64).is_none());
    }

    #[test]
    fn test_too_many_float_slots_declines() {
        let sig = Signature::parse(
            "(f64, f64, f64, f64, f64, f64, f64, f64, f64) -> f64",
        )
        .unwrap();
        assert!(try_bind_generic(&sig, scale_sum as usize as u64).is_none());
    }
}
