//! dynabi: call C functions from signatures known only at runtime.
//!
//! The engine is layered; this crate re-exports the whole public surface.
//!
//! - [`dynabi_frame`]: fixed-shape argument frames and the process-wide
//!   frame pool. Register images are fifteen integer words plus eight
//!   float words.
//! - [`dynabi_call`]: the raw call surface. Fixed-arity primitives
//!   [`call0`]..=[`call15`], the variadic [`call_n`], and the
//!   float-returning families. Unsafe by nature: an address and some
//!   words, no type checking.
//! - [`dynabi_dispatch`]: the safe layer. Parse a [`Signature`], [`bind`]
//!   it to an address, and [`ForeignFn::call`] with dynamic [`Arg`]s.
//! - [`dynabi_load`]: turn library names into open handles and symbol
//!   names into addresses.
//!
//! ```no_run
//! use dynabi::{bind, Arg, NativeLibrary, Signature};
//!
//! let libm = NativeLibrary::open_by_name("m")?;
//! let sig = Signature::parse("(f64) -> f64")?;
//! let cos = bind(&sig, libm.symbol_addr("cos")?).ok_or("unbindable")?;
//! let r = cos.call(&[Arg::F64(0.0)])?;
//! assert_eq!(r.as_f64(), Some(1.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Statically shaped wrappers (the `dynabi-gen` output) skip the dispatch
//! layer entirely and go straight to the fixed-arity primitives.

pub use dynabi_call::*;
pub use dynabi_dispatch::{
    bind, register, AbiType, Arg, CallError, ForeignFn, Pins, Ret, Signature,
    SignatureParseError, Strategy,
};
pub use dynabi_frame::{Frame, FrameGuard, FramePool, FLOAT_SLOTS, INT_SLOTS};
pub use dynabi_load::{platform_lib_name, LoadError, NativeLibrary};

/// Resolve `name` from `lib` and bind it into `slot`.
///
/// Returns `Ok(false)` when the symbol resolves but no strategy accepts
/// the signature; resolution failures are the only error.
pub fn register_symbol(
    slot: &mut Option<ForeignFn>,
    lib: &NativeLibrary,
    name: &str,
    sig: &Signature,
) -> Result<bool, LoadError> {
    let addr = lib.symbol_addr(name)?;
    Ok(register(slot, sig, addr))
}
