//! The fixed-arity call primitives `call0`..`call15`, the variadic
//! `call_n`, and the float variants.
//!
//! Each fixed-arity primitive avoids slice handling and per-call branching
//! entirely: arguments are written straight into the frame's integer slots
//! at known positions. With a warm pool there is no heap allocation on this
//! path.

use dynabi_frame::{FramePool, INT_SLOTS};

use crate::trampoline;

macro_rules! define_call {
    ($name:ident, $argc:literal: $($a:ident => $idx:expr),* $(,)?) => {
        #[doc = concat!(
            "Call `addr` with ", stringify!($argc),
            " positional integer/pointer word(s), returning the primary value register."
        )]
        ///
        /// Panics if `addr` is zero (caller invariant violation).
        ///
        /// # Safety
        ///
        /// `addr` must be the address of a C-callable function whose
        /// integer/pointer parameters are exactly the words supplied here,
        /// in order. Pointer-valued words must stay valid (and, where they
        /// refer to caller-owned storage, kept reachable by the caller)
        /// until this returns.
        pub unsafe fn $name(addr: u64 $(, $a: u64)*) -> u64 {
            assert!(addr != 0, "dynabi: function address is null");
            let mut frame = FramePool::global().acquire();
            frame.addr = addr;
            $( frame.ints[$idx] = $a; )*
            unsafe { trampoline::invoke(&mut frame) };
            frame.ints[0]
        }
    };
}

define_call!(call0, 0:);
define_call!(call1, 1: a1 => 0);
define_call!(call2, 2: a1 => 0, a2 => 1);
define_call!(call3, 3: a1 => 0, a2 => 1, a3 => 2);
define_call!(call4, 4: a1 => 0, a2 => 1, a3 => 2, a4 => 3);
define_call!(call5, 5: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4);
define_call!(call6, 6: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5);
define_call!(call7, 7: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6);
define_call!(call8, 8: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7);
define_call!(call9, 9: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7,
    a9 => 8);
define_call!(call10, 10: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7,
    a9 => 8, a10 => 9);
define_call!(call11, 11: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7,
    a9 => 8, a10 => 9, a11 => 10);
define_call!(call12, 12: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7,
    a9 => 8, a10 => 9, a11 => 10, a12 => 11);
define_call!(call13, 13: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7,
    a9 => 8, a10 => 9, a11 => 10, a12 => 11, a13 => 12);
define_call!(call14, 14: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7,
    a9 => 8, a10 => 9, a11 => 10, a12 => 11, a13 => 12, a14 => 13);
define_call!(call15, 15: a1 => 0, a2 => 1, a3 => 2, a4 => 3, a5 => 4, a6 => 5, a7 => 6, a8 => 7,
    a9 => 8, a10 => 9, a11 => 10, a12 => 11, a13 => 12, a14 => 13, a15 => 14);

/// Variadic raw call: `args` are written positionally into the integer
/// slots. Returns both integer value registers; the second word is only
/// meaningful when the caller knows the callee's result spans two registers
/// (otherwise it is garbage - a known-limited contract).
///
/// Panics if `addr` is zero or if `args` exceeds the register-image width
/// ([`INT_SLOTS`]); both are caller invariant violations.
///
/// # Safety
///
/// Same contract as the fixed-arity primitives.
pub unsafe fn call_n(addr: u64, args: &[u64]) -> (u64, u64) {
    assert!(addr != 0, "dynabi: function address is null");
    assert!(
        args.len() <= INT_SLOTS,
        "dynabi: {} arguments exceed the {} register-image slots",
        args.len(),
        INT_SLOTS
    );
    let mut frame = FramePool::global().acquire();
    frame.addr = addr;
    frame.ints[..args.len()].copy_from_slice(args);
    unsafe { trampoline::invoke(&mut frame) };
    (frame.ints[0], frame.ints[1])
}

macro_rules! define_f32_call {
    ($name:ident, $argc:literal: $($a:ident => $idx:expr),* $(,)?) => {
        #[doc = concat!(
            "Call `addr` with ", stringify!($argc),
            " `f32` argument(s) in the floating-point register image, returning an `f32`."
        )]
        ///
        /// Bit patterns round-trip exactly; nothing is widened or
        /// canonicalized. Panics if `addr` is zero.
        ///
        /// # Safety
        ///
        /// `addr` must be the address of a C-callable function taking
        /// exactly these `float` parameters and returning `float`.
        pub unsafe fn $name(addr: u64 $(, $a: f32)*) -> f32 {
            assert!(addr != 0, "dynabi: function address is null");
            let mut frame = FramePool::global().acquire();
            frame.addr = addr;
            $( frame.floats[$idx] = u64::from($a.to_bits()); )*
            unsafe { trampoline::invoke_f32(&mut frame) };
            f32::from_bits(frame.floats[0] as u32)
        }
    };
}

macro_rules! define_f64_call {
    ($name:ident, $argc:literal: $($a:ident => $idx:expr),* $(,)?) => {
        #[doc = concat!(
            "Call `addr` with ", stringify!($argc),
            " `f64` argument(s) in the floating-point register image, returning an `f64`."
        )]
        ///
        /// Bit patterns round-trip exactly. Panics if `addr` is zero.
        ///
        /// # Safety
        ///
        /// `addr` must be the address of a C-callable function taking
        /// exactly these `double` parameters and returning `double`.
        pub unsafe fn $name(addr: u64 $(, $a: f64)*) -> f64 {
            assert!(addr != 0, "dynabi: function address is null");
            let mut frame = FramePool::global().acquire();
            frame.addr = addr;
            $( frame.floats[$idx] = $a.to_bits(); )*
            unsafe { trampoline::invoke_f64(&mut frame) };
            f64::from_bits(frame.floats[0])
        }
    };
}

define_f32_call!(call_float0, 0:);
define_f32_call!(call_float1, 1: a1 => 0);
define_f32_call!(call_float2, 2: a1 => 0, a2 => 1);
define_f32_call!(call_float3, 3: a1 => 0, a2 => 1, a3 => 2);

define_f64_call!(call_double0, 0:);
define_f64_call!(call_double1, 1: a1 => 0);
define_f64_call!(call_double2, 2: a1 => 0, a2 => 1);
define_f64_call!(call_double3, 3: a1 => 0, a2 => 1, a3 => 2);

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn nullary() -> u64 {
        0x5eed
    }

    extern "C" fn add2(a: u64, b: u64) -> u64 {
        a.wrapping_add(b)
    }

    extern "C" fn scale(a: f64, b: f64) -> f64 {
        a * b
    }

    #[test]
    fn test_call0_returns_value_register() {
        let r = unsafe { call0(nullary as usize as u64) };
        assert_eq!(r, 0x5eed);
    }

    #[test]
    fn test_call2_positional() {
        let r = unsafe { call2(add2 as usize as u64, 40, 2) };
        assert_eq!(r, 42);
    }

    #[test]
    fn test_call_n_matches_fixed_arity() {
        let addr = add2 as usize as u64;
        let (r, _aux) = unsafe { call_n(addr, &[40, 2]) };
        assert_eq!(r, unsafe { call2(addr, 40, 2) });
    }

    #[test]
    fn test_call_double2() {
        let r = unsafe { call_double2(scale as usize as u64, 1.5, 4.0) };
        assert_eq!(r, 6.0);
    }

    #[test]
    #[should_panic(expected = "function address is null")]
    fn test_null_address_panics() {
        let _ = unsafe { call0(0) };
    }

    #[test]
    #[should_panic(expected = "exceed")]
    fn test_call_n_over_capacity_panics() {
        let args = [0u64; 16];
        let _ = unsafe { call_n(nullary as usize as u64, &args) };
    }
}
