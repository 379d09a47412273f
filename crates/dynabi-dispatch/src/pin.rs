//! Scoped keep-reachable guard for transient marshaling buffers.
//!
//! While a foreign call is in flight, the only reference to a marshaled
//! string buffer is a raw address sitting in a register-image slot, which
//! no reachability analysis can see. A [`Pins`] guard owns every such
//! buffer and must outlive the raw call; its drop is the release point, and
//! it runs on all exit paths. The fatal path for a null function address
//! never takes a pin: primitives check the address before any buffer is
//! manufactured.

use std::ffi::{c_char, CString};

use crate::value::CallError;

/// Owner of transient buffers whose addresses are in flight.
#[derive(Default)]
pub struct Pins {
    cstrings: Vec<CString>,
}

impl Pins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `s` into a null-terminated buffer, pin it, and return its
    /// address. The buffer stays alive until the guard drops.
    pub fn pin_str(&mut self, s: &str, index: usize) -> Result<*const c_char, CallError> {
        let cstring = CString::new(s).map_err(|_| CallError::InteriorNul { index })?;
        // The Vec may reallocate, but the CString's heap buffer does not
        // move with it.
        let ptr = cstring.as_ptr();
        self.cstrings.push(cstring);
        Ok(ptr)
    }

    /// Number of buffers currently pinned.
    pub fn len(&self) -> usize {
        self.cstrings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cstrings.is_empty()
    }
}
