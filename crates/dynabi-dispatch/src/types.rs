//! The closed set of argument/return kinds and the signature descriptor.

use std::fmt;

/// Kind classification for a single argument or return value.
///
/// Only this closed set is eligible for an allocation-free path; anything
/// that does not classify lands on [`AbiType::Opaque`], which the generic
/// path rejects and the registrar therefore reports as unbindable.
/// Classification is deliberately total: every spelling maps to *some*
/// kind, so scope selection can fall through instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// Signed integers, 8 to 64 bits.
    I8,
    I16,
    I32,
    I64,
    /// Unsigned integers, 8 to 64 bits.
    U8,
    U16,
    U32,
    U64,
    /// Pointer-sized unsigned integer.
    Usize,
    /// Address-sized opaque pointer; the engine never types it.
    Ptr,
    Bool,
    F32,
    F64,
    /// Null-terminated text string; marshaling manufactures a transient
    /// buffer that stays pinned for the call's duration.
    CStr,
    /// Return kind only: no value.
    Void,
    /// Anything outside the closed set.
    Opaque,
}

impl AbiType {
    /// Parse a textual type spelling. Total: unknown spellings classify as
    /// [`AbiType::Opaque`] rather than failing.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "i8" => AbiType::I8,
            "i16" => AbiType::I16,
            "i32" | "int" => AbiType::I32,
            "i64" | "isize" => AbiType::I64,
            "u8" => AbiType::U8,
            "u16" => AbiType::U16,
            "u32" => AbiType::U32,
            "u64" => AbiType::U64,
            "usize" | "size_t" => AbiType::Usize,
            "ptr" | "pointer" => AbiType::Ptr,
            "bool" => AbiType::Bool,
            "f32" | "float" => AbiType::F32,
            "f64" | "double" => AbiType::F64,
            "str" | "cstr" | "string" => AbiType::CStr,
            "void" | "()" => AbiType::Void,
            _ => AbiType::Opaque,
        }
    }

    /// True for kinds that travel in an integer/pointer register slot.
    pub fn is_word(self) -> bool {
        matches!(
            self,
            AbiType::I8
                | AbiType::I16
                | AbiType::I32
                | AbiType::I64
                | AbiType::U8
                | AbiType::U16
                | AbiType::U32
                | AbiType::U64
                | AbiType::Usize
                | AbiType::Ptr
                | AbiType::Bool
        )
    }

    /// True for the two floating-point kinds.
    pub fn is_float(self) -> bool {
        matches!(self, AbiType::F32 | AbiType::F64)
    }

    fn name(self) -> &'static str {
        match self {
            AbiType::I8 => "i8",
            AbiType::I16 => "i16",
            AbiType::I32 => "i32",
            AbiType::I64 => "i64",
            AbiType::U8 => "u8",
            AbiType::U16 => "u16",
            AbiType::U32 => "u32",
            AbiType::U64 => "u64",
            AbiType::Usize => "usize",
            AbiType::Ptr => "ptr",
            AbiType::Bool => "bool",
            AbiType::F32 => "f32",
            AbiType::F64 => "f64",
            AbiType::CStr => "str",
            AbiType::Void => "void",
            AbiType::Opaque => "opaque",
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered argument kinds plus the return kind of a foreign function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Argument kinds, positional.
    pub args: Vec<AbiType>,
    /// Return kind; [`AbiType::Void`] for none.
    pub ret: AbiType,
}

/// Error from [`Signature::parse`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid signature '{input}': {message}")]
pub struct SignatureParseError {
    pub input: String,
    pub message: String,
}

impl Signature {
    pub fn new(args: Vec<AbiType>, ret: AbiType) -> Self {
        Self { args, ret }
    }

    /// Parse the textual spelling `(kind, kind, ...) -> kind`.
    ///
    /// Unknown kind spellings classify as [`AbiType::Opaque`] (and will
    /// therefore fail to bind); only malformed syntax is an error.
    pub fn parse(s: &str) -> Result<Self, SignatureParseError> {
        let err = |message: &str| SignatureParseError {
            input: s.to_string(),
            message: message.to_string(),
        };

        let body = s.trim();
        let rest = body.strip_prefix('(').ok_or_else(|| err("expected '('"))?;
        let close = rest.find(')').ok_or_else(|| err("unmatched '('"))?;
        let arg_list = &rest[..close];
        let tail = rest[close + 1..].trim();

        let args: Vec<AbiType> = if arg_list.trim().is_empty() {
            Vec::new()
        } else {
            arg_list.split(',').map(AbiType::parse).collect()
        };

        let ret = match tail.strip_prefix("->") {
            Some(ret_str) => AbiType::parse(ret_str),
            None if tail.is_empty() => AbiType::Void,
            None => return Err(err("expected '->' after argument list")),
        };

        Ok(Self { args, ret })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let sig = Signature::parse("(i64, i64) -> i64").unwrap();
        assert_eq!(sig.args, vec![AbiType::I64, AbiType::I64]);
        assert_eq!(sig.ret, AbiType::I64);
    }

    #[test]
    fn test_parse_nullary_void() {
        let sig = Signature::parse("()").unwrap();
        assert!(sig.args.is_empty());
        assert_eq!(sig.ret, AbiType::Void);
    }

    #[test]
    fn test_parse_unknown_kind_is_opaque() {
        let sig = Signature::parse("(gadget) -> f64").unwrap();
        assert_eq!(sig.args, vec![AbiType::Opaque]);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(Signature::parse("i64 -> i64").is_err());
        assert!(Signature::parse("(i64").is_err());
        assert!(Signature::parse("(i64) i64").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let sig = Signature::parse("(ptr, i64) -> i64").unwrap();
        assert_eq!(sig.to_string(), "(ptr, i64) -> i64");
    }
}
