//! Call-time argument and return values, plus the word marshaling rules.

use std::ffi::c_void;

use crate::types::AbiType;

/// A dynamic argument handed to a bound foreign function.
///
/// Integer values travel as `I64`/`U64` regardless of the declared width;
/// marshaling truncates or sign-extends to the declared kind. Pointer
/// arguments carry no ownership: the caller must keep the pointee alive
/// until the call returns.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    I64(i64),
    U64(u64),
    Ptr(*const c_void),
    Bool(bool),
    F32(f32),
    F64(f64),
    /// Marshaled into a transient null-terminated buffer pinned for the
    /// call's duration.
    Str(&'a str),
}

/// A dynamic return value extracted from the register image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ret {
    Void,
    I64(i64),
    U64(u64),
    /// Address bits of a returned pointer.
    Ptr(u64),
    Bool(bool),
    F32(f32),
    F64(f64),
}

impl Ret {
    /// Interpret a raw value-register word according to the declared
    /// return kind. Narrow integers are masked or sign-extended from the
    /// register's low bits; the rest of the register is ABI garbage.
    pub(crate) fn from_word(kind: AbiType, word: u64) -> Ret {
        match kind {
            AbiType::Void => Ret::Void,
            AbiType::Bool => Ret::Bool(word as u8 != 0),
            AbiType::I8 => Ret::I64(word as i8 as i64),
            AbiType::I16 => Ret::I64(word as i16 as i64),
            AbiType::I32 => Ret::I64(word as i32 as i64),
            AbiType::I64 => Ret::I64(word as i64),
            AbiType::U8 => Ret::U64(u64::from(word as u8)),
            AbiType::U16 => Ret::U64(u64::from(word as u16)),
            AbiType::U32 => Ret::U64(u64::from(word as u32)),
            AbiType::U64 | AbiType::Usize => Ret::U64(word),
            AbiType::Ptr => Ret::Ptr(word),
            // Float returns never come through an integer word; the float
            // paths construct Ret::F32/F64 directly.
            AbiType::F32 | AbiType::F64 | AbiType::CStr | AbiType::Opaque => Ret::U64(word),
        }
    }

    /// Convenience accessor for integer-flavored results.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Ret::I64(v) => Some(v),
            Ret::U64(v) => Some(v as i64),
            Ret::Ptr(v) => Some(v as i64),
            Ret::Bool(b) => Some(i64::from(b)),
            _ => None,
        }
    }

    /// Convenience accessor for floating results.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Ret::F64(v) => Some(v),
            Ret::F32(v) => Some(f64::from(v)),
            _ => None,
        }
    }
}

/// Call-time failure of a bound foreign function.
///
/// These are non-fatal: they report a mismatch between the supplied dynamic
/// arguments and the signature the slot was bound with. Invariant
/// violations (null address) panic instead, per the engine's error policy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CallError {
    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("argument {index} does not match declared kind '{expected}'")]
    KindMismatch { index: usize, expected: AbiType },
    #[error("string argument {index} contains an interior NUL byte")]
    InteriorNul { index: usize },
}

pub(crate) fn ensure_arity(args: &[Arg<'_>], expected: usize) -> Result<(), CallError> {
    if args.len() != expected {
        return Err(CallError::ArityMismatch {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Marshal one dynamic argument into an integer register word for the
/// declared kind. Floats and strings are not word kinds and report a
/// mismatch; the float and generic paths route those to their own slots.
pub(crate) fn marshal_word(arg: &Arg<'_>, kind: AbiType, index: usize) -> Result<u64, CallError> {
    let mismatch = || CallError::KindMismatch {
        index,
        expected: kind,
    };

    let bits = match (arg, kind) {
        (Arg::Bool(b), AbiType::Bool) => u64::from(*b),
        (Arg::Ptr(p), AbiType::Ptr) => *p as u64,
        (Arg::U64(v), AbiType::Ptr) => *v,
        (Arg::I64(v), k) if k.is_word() => narrow(k, *v as u64),
        (Arg::U64(v), k) if k.is_word() => narrow(k, *v),
        _ => return Err(mismatch()),
    };
    Ok(bits)
}

/// Truncate or sign-extend a 64-bit word to the declared integer kind, so
/// the callee's register view matches C's conversion rules.
fn narrow(kind: AbiType, bits: u64) -> u64 {
    match kind {
        AbiType::I8 => bits as i8 as i64 as u64,
        AbiType::I16 => bits as i16 as i64 as u64,
        AbiType::I32 => bits as i32 as i64 as u64,
        AbiType::U8 => u64::from(bits as u8),
        AbiType::U16 => u64::from(bits as u16),
        AbiType::U32 => u64::from(bits as u32),
        AbiType::Bool => u64::from(bits != 0),
        _ => bits,
    }
}
