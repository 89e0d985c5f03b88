//! Config schema descriptors, the static handles the registry initializes
//! from.
//!
//! A host declares a config file as a type implementing [`ConfigSchema`]:
//! the two associated constants locate the backing file, and
//! [`declare`](ConfigSchema::declare) registers every option on the builder
//! and returns the typed handles the host keeps using afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_core::{NodeBuilder, OptionHandle};
//! use lattice_runtime::{ConfigDescriptor, ConfigRegistry, ConfigSchema};
//!
//! struct ExampleConfig {
//!     name: OptionHandle<String>,
//! }
//!
//! impl ConfigSchema for ExampleConfig {
//!     const NAMESPACE: &'static str = "mod";
//!     const FILE_NAME: &'static str = "example.json";
//!
//!     fn declare(builder: &mut NodeBuilder) -> Self {
//!         Self {
//!             name: builder.option("name", "test"),
//!         }
//!     }
//! }
//!
//! registry.initialize(vec![ConfigDescriptor::of::<ExampleConfig>()]).await;
//! let config = registry.handles::<ExampleConfig>().unwrap();
//! config.name.set("changed".to_string());
//! ```

use std::any::Any;

use lattice_core::error::SchemaError;
use lattice_core::node::{ConfigNode, NodeBuilder};

/// A type that declares one config file's schema.
///
/// Implementors are instantiated once per process by the registry; the
/// returned value (the typed handles) is stored alongside the tree and
/// handed back through
/// [`ConfigRegistry::handles`](crate::registry::ConfigRegistry::handles).
pub trait ConfigSchema: Sized + Send + Sync + 'static {
    /// Directory under the storage root this config lives in.
    const NAMESPACE: &'static str;

    /// File name including the extension used for codec lookup.
    const FILE_NAME: &'static str;

    /// Registers every option and nested node on `builder` and returns the
    /// typed handles.
    fn declare(builder: &mut NodeBuilder) -> Self;
}

/// A static, type-erased handle to a [`ConfigSchema`] implementation.
///
/// Cheap to construct and `Copy`-free by design: descriptors are consumed
/// by [`ConfigRegistry::initialize`](crate::registry::ConfigRegistry::initialize).
#[derive(Debug)]
pub struct ConfigDescriptor {
    namespace: &'static str,
    file_name: &'static str,
    build: fn(&mut NodeBuilder) -> Box<dyn Any + Send + Sync>,
}

impl ConfigDescriptor {
    /// Creates the descriptor for a schema type.
    pub fn of<T: ConfigSchema>() -> Self {
        Self {
            namespace: T::NAMESPACE,
            file_name: T::FILE_NAME,
            build: |builder| Box::new(T::declare(builder)),
        }
    }

    /// Directory under the storage root.
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// File name including extension.
    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// The file extension used for codec lookup (everything after the last
    /// dot, or the whole name if there is none).
    pub fn extension(&self) -> &'static str {
        self.file_name
            .rsplit('.')
            .next()
            .unwrap_or(self.file_name)
    }

    /// Assembles the tree and the typed handles.
    pub(crate) fn instantiate(
        &self,
    ) -> (Result<ConfigNode, SchemaError>, Box<dyn Any + Send + Sync>) {
        let mut builder = NodeBuilder::root();
        let handles = (self.build)(&mut builder);
        (builder.build(), handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::handle::OptionHandle;

    struct Sample {
        #[allow(dead_code)]
        name: OptionHandle<String>,
    }

    impl ConfigSchema for Sample {
        const NAMESPACE: &'static str = "mod";
        const FILE_NAME: &'static str = "example.json";

        fn declare(builder: &mut NodeBuilder) -> Self {
            Self {
                name: builder.option("name", "test"),
            }
        }
    }

    #[test]
    fn test_descriptor_carries_schema_identity() {
        let descriptor = ConfigDescriptor::of::<Sample>();
        assert_eq!(descriptor.namespace(), "mod");
        assert_eq!(descriptor.file_name(), "example.json");
        assert_eq!(descriptor.extension(), "json");
    }

    #[test]
    fn test_extension_of_undotted_name_is_the_whole_name() {
        struct Odd;
        impl ConfigSchema for Odd {
            const NAMESPACE: &'static str = "mod";
            const FILE_NAME: &'static str = "settings";

            fn declare(_builder: &mut NodeBuilder) -> Self {
                Odd
            }
        }
        assert_eq!(ConfigDescriptor::of::<Odd>().extension(), "settings");
    }

    #[test]
    fn test_instantiate_returns_tree_and_handles() {
        let descriptor = ConfigDescriptor::of::<Sample>();
        let (node, handles) = descriptor.instantiate();
        let node = node.unwrap();
        assert!(node.is_root());
        assert!(node.option("name").is_some());
        assert!(handles.downcast::<Sample>().is_ok());
    }
}
