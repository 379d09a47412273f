//! Typed dispatch registrar.
//!
//! Given a foreign function's declared signature and its resolved address,
//! this crate binds a callable that performs the marshal-call-extract
//! sequence over the raw call surface. Strategy selection is first match
//! wins, with no backtracking:
//!
//! 1. the typed integer/pointer/boolean table (0-8 arguments, zero heap
//!    allocation per call),
//! 2. hand-specialized float-only (0-3 arguments) and single-string
//!    closures,
//! 3. a generic fallback that builds a conversion plan once at bind time
//!    and thereafter marshals through a pooled frame; this path may
//!    allocate per call and is the required behavior for anything outside
//!    the closed set.
//!
//! Failure to match is silent - [`bind`] returns `None` and [`register`]
//! returns `false` - so a caller can surface its own error once every
//! strategy is exhausted. On targets without the raw call surface the whole
//! registrar reports "no strategy available" and never crashes.

#![forbid(unsafe_op_in_unsafe_fn)]

mod pin;
mod registrar;
mod types;
mod value;

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod generic;
#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod typed;

pub use pin::Pins;
pub use registrar::{bind, register, ForeignFn, Strategy};
pub use types::{AbiType, Signature, SignatureParseError};
pub use value::{Arg, CallError, Ret};
