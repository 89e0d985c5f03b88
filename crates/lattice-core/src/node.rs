//! Composite config nodes and their assembly.
//!
//! A [`ConfigNode`] is a named container of option cells and nested nodes,
//! corresponding to one level of a serialized object. Trees are assembled
//! exactly once through a [`NodeBuilder`]: each declaration registers a cell
//! (or nested node) under its key and hands back a typed handle, turning the
//! schema into an explicit, compile-checked declaration list. After
//! [`build`](NodeBuilder::build) the tree shape is immutable; only leaf
//! values change.
//!
//! A *root* node (key `""`) corresponds 1:1 to one storage file. Roots are
//! only ever created by [`NodeBuilder::root`], and the builder offers no way
//! to attach an already-built tree under another node, so nesting one root
//! inside another cannot be expressed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::handle::{ListHandle, NodeListHandle, OptionHandle};
use crate::option::{ElementFactory, OptionCell, SaveSignal};
use crate::value::{ConfigValue, ElementKind, ScalarValue, ValueDescriptor};

// ─── ConfigNode ───────────────────────────────────────────────────────────────

struct NodeInner {
    key: String,
    root: bool,
    options: Vec<Arc<OptionCell>>,
    options_by_key: HashMap<String, usize>,
    children: Vec<ConfigNode>,
    children_by_key: HashMap<String, usize>,
    signal: Arc<SaveSignal>,
}

/// A named container of options and nested nodes.
///
/// Cheap to clone; clones share the same underlying tree.
#[derive(Clone)]
pub struct ConfigNode {
    inner: Arc<NodeInner>,
}

impl ConfigNode {
    /// The node's key within its parent. `""` for roots and collection
    /// elements.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Whether this node is the root of a tree backed by one storage file.
    pub fn is_root(&self) -> bool {
        self.inner.root
    }

    /// The options of this node, in declaration order. The order is stable
    /// across calls, which is what makes codec output deterministic.
    pub fn options(&self) -> &[Arc<OptionCell>] {
        &self.inner.options
    }

    /// The nested nodes of this node, in declaration order.
    pub fn children(&self) -> &[ConfigNode] {
        &self.inner.children
    }

    /// Looks up an option by key.
    pub fn option(&self, key: &str) -> Option<&Arc<OptionCell>> {
        self.inner
            .options_by_key
            .get(key)
            .map(|&index| &self.inner.options[index])
    }

    /// Looks up a nested node by key.
    pub fn child(&self, key: &str) -> Option<&ConfigNode> {
        self.inner
            .children_by_key
            .get(key)
            .map(|&index| &self.inner.children[index])
    }

    /// Dotted-path lookup.
    ///
    /// A single-segment path resolves against this node's options; a
    /// multi-segment path descends through nested nodes. An unknown segment
    /// yields `None` rather than an error, which keeps lookups into
    /// partial or foreign configuration non-fatal.
    pub fn resolve(&self, path: &str) -> Option<ConfigValue> {
        match path.split_once('.') {
            None => self.option(path).map(|cell| cell.value()),
            Some((head, rest)) => self.child(head)?.resolve(rest),
        }
    }

    /// Dotted-path update.
    ///
    /// Routes through the target cell's validated
    /// [`set_value`](OptionCell::set_value), so an ill-typed value or an
    /// unknown segment is a no-op returning `false`.
    pub fn apply(&self, path: &str, value: impl Into<ConfigValue>) -> bool {
        self.apply_value(path, value.into())
    }

    fn apply_value(&self, path: &str, value: ConfigValue) -> bool {
        match path.split_once('.') {
            None => self
                .option(path)
                .is_some_and(|cell| cell.set_value(value)),
            Some((head, rest)) => self
                .child(head)
                .is_some_and(|child| child.apply_value(rest, value)),
        }
    }

    /// The tree's save signal. The owning registry installs its
    /// debounce hook here after the initial load.
    pub fn save_signal(&self) -> &Arc<SaveSignal> {
        &self.inner.signal
    }

    /// Identity comparison: `true` if both handles refer to the same node.
    pub fn same_node(&self, other: &ConfigNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ConfigNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigNode")
            .field("key", &self.inner.key)
            .field("root", &self.inner.root)
            .field("options", &self.inner.options.len())
            .field("children", &self.inner.children.len())
            .finish()
    }
}

// ─── NodeBuilder ──────────────────────────────────────────────────────────────

/// Assembles one node of a config tree.
///
/// Declarations register under their key and return typed handles.
/// Duplicate or empty keys are recorded and surface as a
/// [`SchemaError`] from [`build`](NodeBuilder::build). A schema error is
/// fatal for the whole tree, never silently patched up.
pub struct NodeBuilder {
    key: String,
    root: bool,
    signal: Arc<SaveSignal>,
    options: Vec<Arc<OptionCell>>,
    options_by_key: HashMap<String, usize>,
    children: Vec<ConfigNode>,
    children_by_key: HashMap<String, usize>,
    errors: Vec<SchemaError>,
}

impl NodeBuilder {
    /// Starts the root of a new tree. The root owns the tree's save signal;
    /// every nested declaration shares it.
    pub fn root() -> Self {
        Self::new("", true, SaveSignal::new())
    }

    fn new(key: &str, root: bool, signal: Arc<SaveSignal>) -> Self {
        Self {
            key: key.to_string(),
            root,
            signal,
            options: Vec::new(),
            options_by_key: HashMap::new(),
            children: Vec::new(),
            children_by_key: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Declares a scalar option with a default, returning its typed handle.
    pub fn option<T: ScalarValue>(&mut self, key: &str, default: impl Into<T>) -> OptionHandle<T> {
        let cell = OptionCell::new(
            key,
            ValueDescriptor::scalar(T::KIND),
            default.into().into_value(),
            Arc::clone(&self.signal),
            None,
        );
        self.register_option(Arc::clone(&cell));
        OptionHandle::new(cell)
    }

    /// Declares a collection of scalars with default elements.
    pub fn list<T: ScalarValue + PartialEq>(
        &mut self,
        key: &str,
        defaults: impl IntoIterator<Item = T>,
    ) -> ListHandle<T> {
        let items = defaults
            .into_iter()
            .map(ScalarValue::into_value)
            .collect::<Vec<_>>();
        let cell = OptionCell::new(
            key,
            ValueDescriptor::list(ElementKind::Scalar(T::KIND)),
            ConfigValue::List(items),
            Arc::clone(&self.signal),
            None,
        );
        self.register_option(Arc::clone(&cell));
        ListHandle::new(cell)
    }

    /// Declares a collection of structured elements.
    ///
    /// `declare` describes the shape of one element; it runs once per
    /// element, whether that element is pushed by the host or
    /// reconstructed by a codec. The collection starts empty; push
    /// default elements on the returned handle during declaration to
    /// pre-populate it. Each pushed element is a fully assembled subtree.
    pub fn node_list(
        &mut self,
        key: &str,
        declare: impl Fn(&mut NodeBuilder) + Send + Sync + 'static,
    ) -> NodeListHandle {
        let factory: ElementFactory = Arc::new(move |signal: &Arc<SaveSignal>| {
            let mut builder = NodeBuilder::new("", false, Arc::clone(signal));
            declare(&mut builder);
            builder.finish()
        });

        // Probe the declaration once so element schema errors surface at
        // assembly time, not at first push.
        if let Err(e) = factory(&self.signal) {
            self.errors.push(e);
        }

        let cell = OptionCell::new(
            key,
            ValueDescriptor::list(ElementKind::Node),
            ConfigValue::List(Vec::new()),
            Arc::clone(&self.signal),
            Some(factory),
        );
        self.register_option(Arc::clone(&cell));
        NodeListHandle::new(cell)
    }

    /// Declares a node-valued option: a subtree stored as a leaf, emitted
    /// only when its key was present on load. Returns whatever handles
    /// `declare` produced.
    pub fn node_option<R>(
        &mut self,
        key: &str,
        declare: impl FnOnce(&mut NodeBuilder) -> R,
    ) -> R {
        let mut builder = NodeBuilder::new(key, false, Arc::clone(&self.signal));
        let handles = declare(&mut builder);
        match builder.finish() {
            Ok(node) => {
                let cell = OptionCell::new(
                    key,
                    ValueDescriptor::node(),
                    ConfigValue::Node(node),
                    Arc::clone(&self.signal),
                    None,
                );
                self.register_option(cell);
            }
            Err(e) => self.errors.push(e),
        }
        handles
    }

    /// Declares a nested node. Unlike a node-valued option, a nested node
    /// is always emitted by codecs; presence tracking applies to its
    /// leaves individually. Returns whatever handles `declare` produced.
    pub fn child<R>(&mut self, key: &str, declare: impl FnOnce(&mut NodeBuilder) -> R) -> R {
        let mut builder = NodeBuilder::new(key, false, Arc::clone(&self.signal));
        let handles = declare(&mut builder);
        match builder.finish() {
            Ok(node) => self.register_child(node),
            Err(e) => self.errors.push(e),
        }
        handles
    }

    /// Finishes assembly.
    ///
    /// Returns the first schema error recorded anywhere in the tree, if
    /// any; the registry treats that as fatal for this tree and skips it.
    pub fn build(self) -> Result<ConfigNode, SchemaError> {
        self.finish()
    }

    fn finish(mut self) -> Result<ConfigNode, SchemaError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        Ok(ConfigNode {
            inner: Arc::new(NodeInner {
                key: self.key,
                root: self.root,
                options: self.options,
                options_by_key: self.options_by_key,
                children: self.children,
                children_by_key: self.children_by_key,
                signal: self.signal,
            }),
        })
    }

    fn register_option(&mut self, cell: Arc<OptionCell>) {
        let key = cell.key().to_string();
        if !self.check_key(&key) {
            return;
        }
        self.options_by_key.insert(key, self.options.len());
        self.options.push(cell);
    }

    fn register_child(&mut self, node: ConfigNode) {
        let key = node.key().to_string();
        if !self.check_key(&key) {
            return;
        }
        self.children_by_key.insert(key, self.children.len());
        self.children.push(node);
    }

    /// Keys share one namespace across options and nested nodes, since both
    /// serialize as keys of the same object.
    fn check_key(&mut self, key: &str) -> bool {
        if key.is_empty() {
            self.errors.push(SchemaError::EmptyKey {
                node: self.key.clone(),
            });
            return false;
        }
        if self.options_by_key.contains_key(key) || self.children_by_key.contains_key(key) {
            self.errors.push(SchemaError::DuplicateKey {
                node: self.key.clone(),
                key: key.to_string(),
            });
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarKind;

    #[test]
    fn test_declaration_order_is_preserved() {
        let mut builder = NodeBuilder::root();
        builder.option::<String>("zeta", "z");
        builder.option::<i64>("alpha", 1);
        builder.child("nested", |nested| {
            nested.option::<bool>("flag", true);
        });
        builder.option::<bool>("omega", false);
        let node = builder.build().unwrap();

        let keys: Vec<&str> = node.options().iter().map(|cell| cell.key()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "omega"]);
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].key(), "nested");
        assert!(node.is_root());
        assert!(!node.children()[0].is_root());
    }

    #[test]
    fn test_duplicate_key_is_a_schema_error() {
        let mut builder = NodeBuilder::root();
        builder.option::<String>("name", "a");
        builder.option::<String>("name", "b");
        assert_eq!(
            builder.build().unwrap_err(),
            SchemaError::DuplicateKey {
                node: "".to_string(),
                key: "name".to_string(),
            }
        );
    }

    #[test]
    fn test_option_and_child_share_one_key_namespace() {
        let mut builder = NodeBuilder::root();
        builder.option::<String>("shared", "a");
        builder.child("shared", |nested| {
            nested.option::<bool>("flag", true);
        });
        assert!(matches!(
            builder.build(),
            Err(SchemaError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_empty_key_is_a_schema_error() {
        let mut builder = NodeBuilder::root();
        builder.option::<String>("", "a");
        assert!(matches!(builder.build(), Err(SchemaError::EmptyKey { .. })));
    }

    #[test]
    fn test_nested_schema_errors_propagate_to_the_root() {
        let mut builder = NodeBuilder::root();
        builder.child("nested", |nested| {
            nested.option::<i64>("dup", 1);
            nested.option::<i64>("dup", 2);
        });
        assert_eq!(
            builder.build().unwrap_err(),
            SchemaError::DuplicateKey {
                node: "nested".to_string(),
                key: "dup".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_and_apply_by_dotted_path() {
        let mut builder = NodeBuilder::root();
        builder.option::<String>("name", "test");
        let retries = builder.child("network", |network| {
            network.option::<i64>("retries", 3)
        });
        let node = builder.build().unwrap();

        assert_eq!(node.resolve("name"), Some(ConfigValue::Str("test".into())));
        assert_eq!(node.resolve("network.retries"), Some(ConfigValue::Int(3)));
        // A path to a nested node itself is not a value.
        assert_eq!(node.resolve("network"), None);
        assert_eq!(node.resolve("missing.anything"), None);

        assert!(node.apply("network.retries", ConfigValue::Int(5)));
        assert_eq!(retries.get(), 5);

        // Unknown paths and ill-typed values are silent no-ops.
        assert!(!node.apply("network.missing", ConfigValue::Int(1)));
        assert!(!node.apply("network.retries", ConfigValue::Str("five".into())));
        assert_eq!(retries.get(), 5);
    }

    #[test]
    fn test_node_list_element_schema_error_surfaces_at_assembly() {
        let mut builder = NodeBuilder::root();
        builder.node_list("items", |element| {
            element.option::<i64>("id", 0);
            element.option::<i64>("id", 1);
        });
        assert!(matches!(
            builder.build(),
            Err(SchemaError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_descriptors_reflect_declarations() {
        let mut builder = NodeBuilder::root();
        builder.option::<f64>("ratio", 0.5);
        builder.list::<String>("tags", []);
        let node = builder.build().unwrap();

        assert_eq!(
            node.option("ratio").unwrap().descriptor(),
            ValueDescriptor::scalar(ScalarKind::Float)
        );
        assert_eq!(
            node.option("tags").unwrap().descriptor(),
            ValueDescriptor::list(ElementKind::Scalar(ScalarKind::Str))
        );
    }
}
