//! Shared-library loading and symbol address resolution.
//!
//! The call surface works on raw addresses, so this crate's whole job is
//! turning a library name into an open handle and a symbol name into a
//! `u64`. An address is only valid while the [`NativeLibrary`] that
//! produced it stays open; dropping the handle unloads the library and
//! every address resolved from it dangles.

#![forbid(unsafe_op_in_unsafe_fn)]

use std::path::{Path, PathBuf};

use libloading::Library;

/// Failure to open a library or resolve a symbol from it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load library '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: libloading::Error,
    },
    #[error("symbol '{name}' not found in '{path}': {source}")]
    Symbol {
        name: String,
        path: String,
        #[source]
        source: libloading::Error,
    },
}

/// An open shared library.
pub struct NativeLibrary {
    lib: Library,
    path: PathBuf,
}

impl NativeLibrary {
    /// Open the library at `path` exactly as given.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let lib = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("loaded library '{}'", path.display());
        Ok(Self {
            lib,
            path: path.to_path_buf(),
        })
    }

    /// Open a library by base name, applying the platform's prefix and
    /// extension conventions. Names that already carry an extension or a
    /// path separator are used verbatim.
    pub fn open_by_name(name: &str) -> Result<Self, LoadError> {
        Self::open(platform_lib_name(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `name` to a raw function address.
    ///
    /// The address stays valid only while `self` is open. The function
    /// type behind the symbol is entirely unchecked here; binding it to a
    /// signature is the registrar's job.
    pub fn symbol_addr(&self, name: &str) -> Result<u64, LoadError> {
        let sym: libloading::Symbol<'_, unsafe extern "C" fn()> =
            unsafe { self.lib.get(name.as_bytes()) }.map_err(|source| LoadError::Symbol {
                name: name.to_string(),
                path: self.path.display().to_string(),
                source,
            })?;
        let addr = *sym as usize as u64;
        log::trace!("resolved '{name}' to {addr:#x}");
        Ok(addr)
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish()
    }
}

/// Decorate a bare library name with the platform's prefix and extension.
pub fn platform_lib_name(base: &str) -> String {
    if base.contains('.') || base.contains(std::path::MAIN_SEPARATOR) {
        return base.to_string();
    }
    if cfg!(target_os = "windows") {
        format!("{base}.dll")
    } else if cfg!(target_os = "macos") {
        format!("lib{base}.dylib")
    } else {
        format!("lib{base}.so")
    }
}
