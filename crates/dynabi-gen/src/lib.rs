//! Static wrapper generator.
//!
//! Scans Rust source for `//dynabi:sym LIB_VAR symbol_name` annotations
//! attached to `static` declarations of function type and emits a
//! self-contained module of fixed thunks: one `unsafe extern "C" fn` per
//! symbol that converts its declared arguments positionally into the exact
//! fixed-arity call primitive, plus a `bind_all` function that resolves
//! every symbol address and fills the annotated `Option` slots.
//!
//! The emitted file is meant to be `include!`d (or checked in as a module)
//! next to the annotated declarations; it references the annotated statics
//! by name and the engine as `dynabi::`.
//!
//! Generation is infallible on arbitrary input: malformed annotations are
//! logged and skipped rather than failing the build step that invokes the
//! generator. I/O is the only error source.

mod emit;
mod parse;

use std::path::Path;

pub use parse::{parse_source, ArgDecl, FuncDecl};

/// Failure of the file-to-file wrapper, [`generate_file`].
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Generate wrapper code for every annotated declaration in `source`.
///
/// Deterministic: identical input yields byte-identical output.
pub fn generate(source: &str) -> String {
    let decls = parse_source(source);
    log::debug!("generating {} wrapper(s)", decls.len());
    emit::emit(&decls)
}

/// Read `input`, generate, and write the result to `output`.
pub fn generate_file(input: &Path, output: &Path) -> Result<(), GenError> {
    let source = std::fs::read_to_string(input).map_err(|source| GenError::Read {
        path: input.display().to_string(),
        source,
    })?;
    let generated = generate(&source);
    std::fs::write(output, generated).map_err(|source| GenError::Write {
        path: output.display().to_string(),
        source,
    })
}
