//! The fixed-signature trampoline.
//!
//! The trampoline is the one place the engine touches the platform calling
//! convention. It reinterprets the target address as a C function taking the
//! frame's entire register image - all fifteen integer words and all eight
//! float words - and calls it. Integer and floating-point arguments travel
//! in separate register files on both supported architectures, so a callee
//! that declares fewer parameters simply ignores the surplus registers and
//! the surplus caller-owned stack slots.
//!
//! Three entry points exist because the return register differs by type:
//! integer results come back in the two integer value registers, float
//! results in the first float register. The second integer register is only
//! meaningful when the caller knows its ABI splits a result across two
//! registers; otherwise it holds garbage.
//!
//! Defined only for x86_64/aarch64 on unix-like targets. Everything above
//! this module is gated on the same predicate.

use dynabi_frame::Frame;

/// The two integer value registers as the ABI hands them back.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetPair {
    /// Primary return register.
    pub r0: u64,
    /// Auxiliary return register. Garbage unless the callee returns a
    /// two-register result.
    pub r1: u64,
}

#[rustfmt::skip]
type IntThunk = unsafe extern "C" fn(
    u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64,
    f64, f64, f64, f64, f64, f64, f64, f64,
) -> RetPair;

#[rustfmt::skip]
type F32Thunk = unsafe extern "C" fn(
    u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64,
    f64, f64, f64, f64, f64, f64, f64, f64,
) -> f32;

#[rustfmt::skip]
type F64Thunk = unsafe extern "C" fn(
    u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64, u64,
    f64, f64, f64, f64, f64, f64, f64, f64,
) -> f64;

macro_rules! spill {
    ($thunk:expr, $frame:expr) => {{
        let i = &$frame.ints;
        let f = &$frame.floats;
        $thunk(
            i[0], i[1], i[2], i[3], i[4], i[5], i[6], i[7], i[8], i[9], i[10],
            i[11], i[12], i[13], i[14],
            f64::from_bits(f[0]), f64::from_bits(f[1]), f64::from_bits(f[2]),
            f64::from_bits(f[3]), f64::from_bits(f[4]), f64::from_bits(f[5]),
            f64::from_bits(f[6]), f64::from_bits(f[7]),
        )
    }};
}

/// Submit a populated frame for an integer-returning call.
///
/// On return, `ints[0]` holds the primary value register and `ints[1]` the
/// auxiliary one.
///
/// # Safety
///
/// `frame.addr` must be the address of a C-callable function whose declared
/// parameters are covered, in order and register class, by the populated
/// slots. The frame must stay borrowed by the caller for the full call.
pub unsafe fn invoke(frame: &mut Frame) {
    let thunk: IntThunk = unsafe { std::mem::transmute(frame.addr as usize) };
    let ret = unsafe { spill!(thunk, frame) };
    frame.ints[0] = ret.r0;
    frame.ints[1] = ret.r1;
}

/// Submit a populated frame for an `f32`-returning call; the result's bit
/// pattern lands in `floats[0]`.
///
/// # Safety
///
/// Same contract as [`invoke`], and the callee must return a 32-bit float.
pub unsafe fn invoke_f32(frame: &mut Frame) {
    let thunk: F32Thunk = unsafe { std::mem::transmute(frame.addr as usize) };
    let ret = unsafe { spill!(thunk, frame) };
    frame.floats[0] = u64::from(ret.to_bits());
}

/// Submit a populated frame for an `f64`-returning call; the result's bit
/// pattern lands in `floats[0]`.
///
/// # Safety
///
/// Same contract as [`invoke`], and the callee must return a 64-bit float.
pub unsafe fn invoke_f64(frame: &mut Frame) {
    let thunk: F64Thunk = unsafe { std::mem::transmute(frame.addr as usize) };
    let ret = unsafe { spill!(thunk, frame) };
    frame.floats[0] = ret.to_bits();
}
