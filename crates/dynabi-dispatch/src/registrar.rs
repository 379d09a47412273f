//! Strategy selection and the bound-callable handle.

use std::fmt;

use crate::types::Signature;
use crate::value::{Arg, CallError, Ret};

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
use crate::{generic, typed};

pub(crate) type Thunk = Box<dyn Fn(&[Arg]) -> Result<Ret, CallError> + Send + Sync>;

/// Which marshaling path a binding selected. Observable for diagnostics
/// and tests; the call behavior of equal signatures is identical across
/// strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fixed integer/pointer/boolean arm, zero allocation per call.
    Typed,
    /// Homogeneous float arm, zero allocation per call.
    Float,
    /// Single-string arm; allocates the transient buffer per call.
    CString,
    /// Plan-driven fallback; may allocate per call.
    Generic,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Typed => "typed",
            Strategy::Float => "float",
            Strategy::CString => "cstring",
            Strategy::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// A foreign function bound to a marshaling strategy.
///
/// Cheap to call, `Send + Sync`, and immutable once built. Rebinding a
/// symbol means building a new handle.
pub struct ForeignFn {
    addr: u64,
    sig: Signature,
    strategy: Strategy,
    thunk: Thunk,
}

impl ForeignFn {
    /// Invoke the foreign function with dynamic arguments.
    ///
    /// Arity and kind mismatches surface as [`CallError`]; what the foreign
    /// code itself does is outside the engine's contract.
    pub fn call(&self, args: &[Arg]) -> Result<Ret, CallError> {
        (self.thunk)(args)
    }

    pub fn addr(&self) -> u64 {
        self.addr
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl fmt::Debug for ForeignFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignFn")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("sig", &self.sig.to_string())
            .field("strategy", &self.strategy)
            .finish()
    }
}

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
fn select(sig: &Signature, addr: u64) -> Option<(Strategy, Thunk)> {
    if let Some(t) = typed::try_bind_typed(sig, addr) {
        return Some((Strategy::Typed, t));
    }
    if let Some(t) = typed::try_bind_float(sig, addr) {
        return Some((Strategy::Float, t));
    }
    if let Some(t) = typed::try_bind_string(sig, addr) {
        return Some((Strategy::CString, t));
    }
    generic::try_bind_generic(sig, addr).map(|t| (Strategy::Generic, t))
}

#[cfg(not(all(unix, any(target_arch = "x86_64", target_arch = "aarch64"))))]
fn select(_sig: &Signature, _addr: u64) -> Option<(Strategy, Thunk)> {
    None
}

/// Bind `addr` under `sig`, selecting the first strategy that accepts the
/// signature. Returns `None` when no strategy does; the signature and
/// address are untouched and the caller may fall back however it likes.
///
/// Panics if `addr` is null: resolving a symbol must happen before
/// binding, and a null address here is a bug in the caller.
pub fn bind(sig: &Signature, addr: u64) -> Option<ForeignFn> {
    assert!(addr != 0, "dynabi: function address is null");
    match select(sig, addr) {
        Some((strategy, thunk)) => {
            log::debug!("bound {sig} at {addr:#x} via {strategy} strategy");
            Some(ForeignFn {
                addr,
                sig: sig.clone(),
                strategy,
                thunk,
            })
        }
        None => {
            log::debug!("no strategy accepts {sig}");
            None
        }
    }
}

/// Bind into a slot. Leaves the slot untouched and returns `false` when no
/// strategy accepts the signature.
pub fn register(slot: &mut Option<ForeignFn>, sig: &Signature, addr: u64) -> bool {
    match bind(sig, addr) {
        Some(f) => {
            *slot = Some(f);
            true
        }
        None => false,
    }
}
