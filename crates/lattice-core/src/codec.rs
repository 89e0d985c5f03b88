//! The pluggable codec contract and the extension registry.
//!
//! A codec converts one config tree to and from one storage format's text
//! representation. The contract is deliberately small: text in, text out,
//! no binary framing. One codec instance serves every tree of its format.
//!
//! Implementations walk the tree through [`ConfigNode::options`] /
//! [`ConfigNode::children`] (declaration order, so output is deterministic
//! and diff-friendly) and must uphold two rules:
//!
//! - **decode** merges the parsed source into the target node in place:
//!   recurse into matching nested nodes, convert-and-
//!   [`set_value`](crate::option::OptionCell::set_value) matching options,
//!   and mark options missing from the source as absent via
//!   [`set_present_on_load`](crate::option::OptionCell::set_present_on_load).
//!   A conversion failure on one key must not prevent sibling keys from
//!   being applied.
//! - **encode** emits every option whose key was present on load, skips
//!   those that were not, and always recurses into nested nodes (presence
//!   tracking lives on leaves, not containers).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CodecError, CodecResult};
use crate::node::ConfigNode;

/// A format-specific converter between a node subtree and its text
/// representation.
pub trait ConfigCodec: Send + Sync {
    /// The file extension this codec is responsible for, without the dot.
    fn file_extension(&self) -> &'static str;

    /// Parses `data` and merges it into `node` in place.
    fn decode(&self, data: &str, node: &ConfigNode) -> CodecResult<()>;

    /// Serializes `node` depth-first into this codec's text format.
    fn encode(&self, node: &ConfigNode) -> CodecResult<String>;
}

// ─── CodecRegistry ────────────────────────────────────────────────────────────

/// Extension → codec lookup table.
///
/// Owned by the config registry: one instance per process, constructed by
/// the host, not a global. Registration is single-writer; a duplicate
/// extension is a fatal configuration error, reported instead of silently
/// overwriting.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<HashMap<String, Arc<dyn ConfigCodec>>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a codec under its file extension.
    ///
    /// # Errors
    ///
    /// [`CodecError::DuplicateExtension`] if the extension already has a
    /// codec.
    pub fn register(&self, codec: Arc<dyn ConfigCodec>) -> CodecResult<()> {
        let extension = codec.file_extension();
        let mut codecs = self.codecs.write();
        if codecs.contains_key(extension) {
            return Err(CodecError::DuplicateExtension(extension.to_string()));
        }
        codecs.insert(extension.to_string(), codec);
        Ok(())
    }

    /// Looks up the codec for `extension`.
    pub fn get(&self, extension: &str) -> Option<Arc<dyn ConfigCodec>> {
        self.codecs.read().get(extension).cloned()
    }

    /// The registered extensions, for startup logging.
    pub fn extensions(&self) -> Vec<String> {
        self.codecs.read().keys().cloned().collect()
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullCodec;

    impl ConfigCodec for NullCodec {
        fn file_extension(&self) -> &'static str {
            "null"
        }

        fn decode(&self, _data: &str, _node: &ConfigNode) -> CodecResult<()> {
            Ok(())
        }

        fn encode(&self, _node: &ConfigNode) -> CodecResult<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_duplicate_extension_is_rejected() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(NullCodec)).unwrap();
        assert!(matches!(
            registry.register(Arc::new(NullCodec)),
            Err(CodecError::DuplicateExtension(ext)) if ext == "null"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let registry = CodecRegistry::new();
        assert!(registry.get("json").is_none());
        registry.register(Arc::new(NullCodec)).unwrap();
        assert!(registry.get("null").is_some());
        assert_eq!(registry.extensions(), vec!["null".to_string()]);
    }
}
