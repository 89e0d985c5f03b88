//! Leaf option cells and the per-tree save signal.
//!
//! An [`OptionCell`] is a named, typed, mutable value slot. Host code never
//! constructs one directly: cells are created during node assembly and
//! reached through the typed handles returned at declaration time
//! ([`OptionHandle`](crate::handle::OptionHandle) and friends) or through a
//! codec walking the tree.
//!
//! Every successful mutation reports upward through the tree's shared
//! [`SaveSignal`] so the owning registry can debounce a save.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, error};

use crate::error::SchemaError;
use crate::node::ConfigNode;
use crate::value::{ConfigValue, ValueDescriptor, ValueKind};

// ─── SaveSignal ───────────────────────────────────────────────────────────────

type SaveHook = Arc<dyn Fn() + Send + Sync>;

/// Builds fresh element subtrees for a collection of structured elements.
pub(crate) type ElementFactory =
    Arc<dyn Fn(&Arc<SaveSignal>) -> Result<ConfigNode, SchemaError> + Send + Sync>;

/// The mutation-to-persistence channel of one config tree.
///
/// Exactly one signal exists per tree; every cell and node in the tree holds
/// a reference to it. The registry installs a hook after the initial load,
/// and every later mutation calls [`notify`](SaveSignal::notify). With no
/// hook installed, notifications are no-ops, which is what keeps
/// codec-driven writes during the initial load from scheduling saves.
#[derive(Default)]
pub struct SaveSignal {
    hook: RwLock<Option<SaveHook>>,
}

impl SaveSignal {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Installs the hook invoked on every mutation. Replaces any previous
    /// hook.
    pub fn install(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook.write() = Some(Arc::new(hook));
    }

    /// Fires the installed hook, if any.
    ///
    /// The hook is cloned out before it runs, so it may take arbitrary locks
    /// of its own.
    pub fn notify(&self) {
        let hook = self.hook.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

// ─── OptionCell ───────────────────────────────────────────────────────────────

pub(crate) struct OptionState {
    pub(crate) value: ConfigValue,
    pub(crate) present_on_load: bool,
}

/// A single named, typed, mutable leaf value with a default and a
/// load-presence flag.
///
/// Cells live for the entire lifetime of their owning node and are shared
/// (`Arc`) between the node, the typed handles and any codec walking the
/// tree. All state is behind a short-critical-section lock, so mutation is
/// safe from arbitrary threads.
pub struct OptionCell {
    key: String,
    descriptor: ValueDescriptor,
    element_factory: Option<ElementFactory>,
    default: ConfigValue,
    state: Mutex<OptionState>,
    signal: Arc<SaveSignal>,
}

impl OptionCell {
    pub(crate) fn new(
        key: &str,
        descriptor: ValueDescriptor,
        default: ConfigValue,
        signal: Arc<SaveSignal>,
        element_factory: Option<ElementFactory>,
    ) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            descriptor,
            element_factory,
            state: Mutex::new(OptionState {
                value: default.clone(),
                present_on_load: true,
            }),
            default,
            signal,
        })
    }

    /// The cell's key within its parent node.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The declared value shape.
    pub fn descriptor(&self) -> ValueDescriptor {
        self.descriptor
    }

    /// The default declared at assembly time.
    pub fn default_value(&self) -> &ConfigValue {
        &self.default
    }

    /// A snapshot of the current value.
    ///
    /// For node-valued and node-element values the snapshot shares the
    /// underlying subtree, so mutating through it still reports upward.
    pub fn value(&self) -> ConfigValue {
        self.state.lock().value.clone()
    }

    /// Whether the key existed in the most recently decoded source.
    ///
    /// Starts `true`; codecs clear it for keys missing from the source and
    /// honor it on encode by omitting the key.
    pub fn present_on_load(&self) -> bool {
        self.state.lock().present_on_load
    }

    /// Records load presence. Intended for codec implementations.
    pub fn set_present_on_load(&self, present: bool) {
        self.state.lock().present_on_load = present;
    }

    /// Validates `candidate` against the descriptor and, on success,
    /// replaces the stored value and fires the save signal.
    ///
    /// A failing check is a silent no-op: the value is left unchanged, no
    /// notification fires and `false` is returned. Codecs may hand us
    /// loosely-typed decoded data; the cell's job is to accept or ignore,
    /// never to fail the caller. The load-presence flag is not touched
    /// either way.
    ///
    /// Node-valued cells reject whole-value replacement: their state is
    /// reached through the subtree's own cells, which keeps handles into
    /// the subtree live.
    pub fn set_value(&self, candidate: ConfigValue) -> bool {
        if matches!(self.descriptor.kind(), ValueKind::Node) {
            debug!(key = %self.key, "node-valued options cannot be replaced wholesale");
            return false;
        }
        if !self.descriptor.accepts(&candidate) {
            debug!(key = %self.key, "rejected ill-typed value");
            return false;
        }
        {
            self.state.lock().value = candidate;
        }
        self.signal.notify();
        true
    }

    /// Builds a fresh element subtree for a collection of structured
    /// elements, sharing this cell's save signal.
    ///
    /// Returns `None` for cells that are not node-element collections, or if
    /// the element declaration itself is invalid (the builder also reports
    /// that at assembly time).
    pub fn new_element(&self) -> Option<ConfigNode> {
        let factory = self.element_factory.as_ref()?;
        match factory(&self.signal) {
            Ok(node) => Some(node),
            Err(e) => {
                error!(key = %self.key, error = %e, "element declaration is invalid");
                None
            }
        }
    }

    /// Fires the save signal. Used by handles after a structural mutation
    /// that bypasses [`set_value`](Self::set_value).
    pub(crate) fn notify_owner(&self) {
        self.signal.notify();
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, OptionState> {
        self.state.lock()
    }
}
