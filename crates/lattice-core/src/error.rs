//! Error types for the Lattice core.

use thiserror::Error;

/// Schema definition errors, detected during node assembly.
///
/// A schema error is fatal for the tree being assembled; the registry
/// skips that tree and carries on with the others.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Two declarations registered the same key within one node.
    #[error("duplicate key '{key}' in node '{node}'")]
    DuplicateKey {
        /// Key of the node the duplicate appeared in (`""` for the root).
        node: String,
        /// The colliding key.
        key: String,
    },

    /// A declaration used an empty key.
    #[error("empty option key in node '{node}'")]
    EmptyKey {
        /// Key of the node the declaration appeared in (`""` for the root).
        node: String,
    },
}

/// Result type for assembly operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors crossing the codec boundary.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The source text could not be parsed into the format's native tree.
    #[error("failed to parse source text: {0}")]
    Parse(String),

    /// A node subtree could not be rendered to text.
    #[error("failed to encode node: {0}")]
    Encode(String),

    /// A codec was registered for an extension that already has one.
    /// Fatal at registration time, never silently overwritten.
    #[error("a codec for file extension '{0}' is already registered")]
    DuplicateExtension(String),

    /// No codec is registered for the requested extension.
    #[error("no codec registered for file extension '{0}'")]
    UnknownExtension(String),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
