//! Typed handles returned at declaration time.
//!
//! Declaring an option on a [`NodeBuilder`](crate::node::NodeBuilder) hands
//! back a cheap, cloneable handle to the underlying cell. The handle *is*
//! the live, owner-observed view of the value: every mutation made through
//! it reports upward to the owning registry, and reads always reflect the
//! current tree state. There is no detached copy to go stale.
//!
//! # Example
//!
//! ```rust,ignore
//! struct ExampleConfig {
//!     name: OptionHandle<String>,
//!     retries: OptionHandle<i64>,
//!     tags: ListHandle<String>,
//! }
//!
//! let mut builder = NodeBuilder::root();
//! let config = ExampleConfig {
//!     name: builder.option("name", "test"),
//!     retries: builder.option("retries", 3),
//!     tags: builder.list("tags", ["default".to_string()]),
//! };
//! let node = builder.build()?;
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::node::ConfigNode;
use crate::option::OptionCell;
use crate::value::{ConfigValue, ScalarValue};

// ─── OptionHandle ─────────────────────────────────────────────────────────────

/// Typed handle to a scalar option.
///
/// Reads and writes are infallible: the cell was declared with this exact
/// type, and every write path validates against the declaration.
pub struct OptionHandle<T: ScalarValue> {
    cell: Arc<OptionCell>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ScalarValue> Clone for OptionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            _marker: PhantomData,
        }
    }
}

impl<T: ScalarValue> OptionHandle<T> {
    pub(crate) fn new(cell: Arc<OptionCell>) -> Self {
        Self {
            cell,
            _marker: PhantomData,
        }
    }

    /// The option's key within its parent node.
    pub fn key(&self) -> &str {
        self.cell.key()
    }

    /// Returns the current value.
    pub fn get(&self) -> T {
        // Every write is validated against the declaration, so the stored
        // variant always matches T.
        T::from_value(&self.cell.value()).expect("option value matches its declared type")
    }

    /// Replaces the value and schedules a save on the owning tree.
    pub fn set(&self, value: T) {
        self.cell.set_value(value.into_value());
    }

    /// The underlying cell, for codec-level introspection.
    pub fn cell(&self) -> &Arc<OptionCell> {
        &self.cell
    }
}

// ─── ListHandle ───────────────────────────────────────────────────────────────

/// Typed handle to a collection of scalars.
///
/// The sequence is order-preserving and duplicate-rejecting: [`insert`]
/// appends only when the element is not already present. Structural
/// mutators fire the save signal only when the underlying sequence actually
/// changed; a rejected duplicate or a no-op removal never schedules a
/// save.
///
/// [`insert`]: ListHandle::insert
pub struct ListHandle<T: ScalarValue + PartialEq> {
    cell: Arc<OptionCell>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ScalarValue + PartialEq> Clone for ListHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            _marker: PhantomData,
        }
    }
}

impl<T: ScalarValue + PartialEq> ListHandle<T> {
    pub(crate) fn new(cell: Arc<OptionCell>) -> Self {
        Self {
            cell,
            _marker: PhantomData,
        }
    }

    /// The option's key within its parent node.
    pub fn key(&self) -> &str {
        self.cell.key()
    }

    /// A snapshot of the current elements.
    pub fn values(&self) -> Vec<T> {
        match self.cell.value() {
            ConfigValue::List(items) => items.iter().filter_map(T::from_value).collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self.cell.value() {
            ConfigValue::List(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: &T) -> bool {
        let candidate = value.clone().into_value();
        match self.cell.value() {
            ConfigValue::List(items) => items.contains(&candidate),
            _ => false,
        }
    }

    /// Appends `value` unless an equal element is already present.
    ///
    /// Returns whether the sequence changed; only a genuine insert
    /// schedules a save.
    pub fn insert(&self, value: T) -> bool {
        let candidate = value.into_value();
        let changed = {
            let mut state = self.cell.state();
            match &mut state.value {
                ConfigValue::List(items) if !items.contains(&candidate) => {
                    items.push(candidate);
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.cell.notify_owner();
        }
        changed
    }

    /// Removes the first element equal to `value`.
    ///
    /// Returns whether anything was removed; a no-op removal does not
    /// schedule a save.
    pub fn remove(&self, value: &T) -> bool {
        let candidate = value.clone().into_value();
        let changed = {
            let mut state = self.cell.state();
            match &mut state.value {
                ConfigValue::List(items) => {
                    match items.iter().position(|item| *item == candidate) {
                        Some(index) => {
                            items.remove(index);
                            true
                        }
                        None => false,
                    }
                }
                _ => false,
            }
        };
        if changed {
            self.cell.notify_owner();
        }
        changed
    }

    /// Removes all elements. Schedules a save only if the sequence was
    /// non-empty.
    pub fn clear(&self) -> bool {
        let changed = {
            let mut state = self.cell.state();
            match &mut state.value {
                ConfigValue::List(items) if !items.is_empty() => {
                    items.clear();
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.cell.notify_owner();
        }
        changed
    }

    /// Keeps only the elements matching the predicate, like removing
    /// through a cursor. Schedules a save only if anything was removed.
    pub fn retain(&self, mut predicate: impl FnMut(&T) -> bool) {
        let changed = {
            let mut state = self.cell.state();
            match &mut state.value {
                ConfigValue::List(items) => {
                    let before = items.len();
                    items.retain(|item| match T::from_value(item) {
                        Some(value) => predicate(&value),
                        None => true,
                    });
                    items.len() != before
                }
                _ => false,
            }
        };
        if changed {
            self.cell.notify_owner();
        }
    }

    /// Replaces the whole sequence and schedules a save.
    pub fn set(&self, values: impl IntoIterator<Item = T>) {
        let items = values.into_iter().map(ScalarValue::into_value).collect();
        self.cell.set_value(ConfigValue::List(items));
    }

    /// The underlying cell, for codec-level introspection.
    pub fn cell(&self) -> &Arc<OptionCell> {
        &self.cell
    }
}

// ─── NodeListHandle ───────────────────────────────────────────────────────────

/// Handle to a collection of structured elements.
///
/// Each element is a node subtree built from the declaration passed to
/// [`node_list`](crate::node::NodeBuilder::node_list). Elements share the
/// tree's save signal, so mutating a field *inside* an element schedules a
/// save just like structural changes to the collection itself.
#[derive(Clone)]
pub struct NodeListHandle {
    cell: Arc<OptionCell>,
}

impl NodeListHandle {
    pub(crate) fn new(cell: Arc<OptionCell>) -> Self {
        Self { cell }
    }

    /// The option's key within its parent node.
    pub fn key(&self) -> &str {
        self.cell.key()
    }

    /// Builds a fresh element from the declared shape, appends it and
    /// schedules a save. Returns the element for field population.
    pub fn push(&self) -> ConfigNode {
        let element = self
            .cell
            .new_element()
            .expect("node list cells always carry an element factory");
        {
            let mut state = self.cell.state();
            if let ConfigValue::List(items) = &mut state.value {
                items.push(ConfigValue::Node(element.clone()));
            }
        }
        self.cell.notify_owner();
        element
    }

    pub fn len(&self) -> usize {
        match self.cell.value() {
            ConfigValue::List(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<ConfigNode> {
        match self.cell.value() {
            ConfigValue::List(items) => items.get(index).and_then(|item| item.as_node().cloned()),
            _ => None,
        }
    }

    /// A snapshot of the current elements.
    pub fn nodes(&self) -> Vec<ConfigNode> {
        match self.cell.value() {
            ConfigValue::List(items) => items
                .iter()
                .filter_map(|item| item.as_node().cloned())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Removes and returns the element at `index`. An out-of-range index is
    /// a no-op and does not schedule a save.
    pub fn remove(&self, index: usize) -> Option<ConfigNode> {
        let removed = {
            let mut state = self.cell.state();
            match &mut state.value {
                ConfigValue::List(items) if index < items.len() => {
                    items.remove(index).as_node().cloned()
                }
                _ => None,
            }
        };
        if removed.is_some() {
            self.cell.notify_owner();
        }
        removed
    }

    /// Removes all elements. Schedules a save only if the sequence was
    /// non-empty.
    pub fn clear(&self) -> bool {
        let changed = {
            let mut state = self.cell.state();
            match &mut state.value {
                ConfigValue::List(items) if !items.is_empty() => {
                    items.clear();
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.cell.notify_owner();
        }
        changed
    }

    /// Keeps only the elements matching the predicate. Schedules a save
    /// only if anything was removed.
    pub fn retain(&self, mut predicate: impl FnMut(&ConfigNode) -> bool) {
        let changed = {
            let mut state = self.cell.state();
            match &mut state.value {
                ConfigValue::List(items) => {
                    let before = items.len();
                    items.retain(|item| match item.as_node() {
                        Some(node) => predicate(node),
                        None => true,
                    });
                    items.len() != before
                }
                _ => false,
            }
        };
        if changed {
            self.cell.notify_owner();
        }
    }

    /// The underlying cell, for codec-level introspection.
    pub fn cell(&self) -> &Arc<OptionCell> {
        &self.cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeBuilder;
    use crate::value::ConfigValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hook_counter(node: &ConfigNode) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let hooked = Arc::clone(&count);
        node.save_signal().install(move || {
            hooked.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_insert_rejects_duplicates_without_notifying() {
        let mut builder = NodeBuilder::root();
        let tags: ListHandle<String> = builder.list("tags", ["a".to_string()]);
        let node = builder.build().unwrap();
        let saves = hook_counter(&node);

        assert!(!tags.insert("a".to_string()));
        assert_eq!(saves.load(Ordering::SeqCst), 0);

        assert!(tags.insert("b".to_string()));
        assert_eq!(saves.load(Ordering::SeqCst), 1);
        assert_eq!(tags.values(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_noop_removal_does_not_notify() {
        let mut builder = NodeBuilder::root();
        let tags: ListHandle<String> = builder.list("tags", ["a".to_string()]);
        let node = builder.build().unwrap();
        let saves = hook_counter(&node);

        assert!(!tags.remove(&"missing".to_string()));
        assert_eq!(saves.load(Ordering::SeqCst), 0);

        assert!(tags.remove(&"a".to_string()));
        assert_eq!(saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_and_retain_notify_only_on_change() {
        let mut builder = NodeBuilder::root();
        let tags: ListHandle<String> =
            builder.list("tags", ["a".to_string(), "b".to_string()]);
        let node = builder.build().unwrap();
        let saves = hook_counter(&node);

        tags.retain(|tag| tag != "a");
        assert_eq!(saves.load(Ordering::SeqCst), 1);
        tags.retain(|_| true);
        assert_eq!(saves.load(Ordering::SeqCst), 1);

        assert!(tags.clear());
        assert_eq!(saves.load(Ordering::SeqCst), 2);
        assert!(!tags.clear());
        assert_eq!(saves.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_element_field_mutation_notifies_owner() {
        let mut builder = NodeBuilder::root();
        let items = builder.node_list("items", |element| {
            element.option::<i64>("id", 0);
        });
        let node = builder.build().unwrap();
        let saves = hook_counter(&node);

        let element = items.push();
        assert_eq!(saves.load(Ordering::SeqCst), 1);

        assert!(element.apply("id", ConfigValue::Int(7)));
        assert_eq!(saves.load(Ordering::SeqCst), 2);
        assert_eq!(element.resolve("id"), Some(ConfigValue::Int(7)));
    }

    #[test]
    fn test_option_handle_set_notifies() {
        let mut builder = NodeBuilder::root();
        let name: OptionHandle<String> = builder.option("name", "test");
        let node = builder.build().unwrap();
        let saves = hook_counter(&node);

        name.set("changed".to_string());
        assert_eq!(name.get(), "changed");
        assert_eq!(saves.load(Ordering::SeqCst), 1);
    }
}
