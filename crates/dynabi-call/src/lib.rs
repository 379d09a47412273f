//! Raw call surface: fixed-arity and variadic call primitives.
//!
//! This crate turns a function address plus positional register-sized words
//! into an actual native call. Every primitive follows the same shape:
//! borrow a frame from the process-wide pool, populate its slots
//! positionally, hand it to the trampoline, read the return slot, and let
//! the guard wipe and recycle the frame.
//!
//! The fast path is the family [`call0`] through [`call15`]; [`call_n`] is
//! the variadic fallback and additionally exposes the auxiliary value
//! register. Float-returning callees go through [`call_float0`]..=3 /
//! [`call_double0`]..=3, which populate the floating-point register image
//! instead and reinterpret the return slot's bit pattern.
//!
//! A null function address is a caller invariant violation and aborts the
//! call path with a panic before any frame is borrowed. The raw layer never
//! retries, reorders, or coalesces calls: the observable side effects of a
//! primitive are exactly those of the foreign function.
//!
//! Only x86_64 and aarch64 on unix-like systems are supported; on every
//! other target this crate exports nothing but [`SUPPORTED`] (= `false`),
//! and registration layers above it degrade to "no strategy available".

#![forbid(unsafe_op_in_unsafe_fn)]

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod direct;
#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod trampoline;

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
pub use direct::*;
#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
pub use trampoline::{invoke, invoke_f32, invoke_f64, RetPair};

/// Whether the raw call surface exists on this target.
pub const SUPPORTED: bool = cfg!(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")));
