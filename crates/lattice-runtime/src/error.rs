//! Runtime error types.

use thiserror::Error;

use lattice_core::error::{CodecError, SchemaError};

/// Errors that abort the initialization of a single config descriptor.
///
/// These never cross `initialize`; the registry logs them and carries on
/// with the remaining descriptors. I/O and decode failures are not in this
/// enum at all: a tree whose file cannot be read or parsed still
/// initializes and keeps running on its defaults.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The descriptor's schema failed to assemble.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// No codec is registered for the descriptor's file extension, or the
    /// codec setup itself is invalid.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A config with the same namespace and file name is already
    /// registered.
    #[error("config '{0}' is already registered")]
    DuplicateEntry(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
