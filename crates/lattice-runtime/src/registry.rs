//! The config registry: load-or-create, debounced coalesced saves and
//! shutdown flush.
//!
//! [`ConfigRegistry`] owns every initialized config tree. It is a plain
//! object constructed once by the host and passed by reference, not a
//! global. Lifecycle:
//!
//! 1. [`initialize`](ConfigRegistry::initialize) assembles each descriptor,
//!    loads its backing file (or creates it with defaults) and installs the
//!    save hook on the tree.
//! 2. Every later mutation anywhere in a tree fires that hook; the registry
//!    debounces it (cancel the pending save, schedule a fresh one after the
//!    debounce window) so a burst of mutations collapses into one write.
//! 3. [`flush_all`](ConfigRegistry::flush_all) drains everything
//!    synchronously at shutdown; afterwards no pending task remains.
//!
//! Saves run on the Tokio runtime captured at initialization, so a mutating
//! caller never blocks on file I/O. Each entry guards its pending-save
//! state with its own lock: cancel-then-reschedule is atomic, at most one
//! deferred task exists per entry, and the write itself happens under the
//! same lock, so overlapping writes to one file cannot occur. Entries are
//! independent; there is no cross-entry locking.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use lattice_codec_json::JsonCodec;
use lattice_core::codec::{CodecRegistry, ConfigCodec};
use lattice_core::error::{CodecError, CodecResult};
use lattice_core::node::ConfigNode;

use crate::descriptor::{ConfigDescriptor, ConfigSchema};
use crate::error::{RegistryError, RegistryResult};

/// Delay between the most recent mutation and the save it schedules.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

// ─── ConfigEntry ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct PendingSave {
    task: Option<JoinHandle<()>>,
    /// Bumped on every reschedule and flush; a deferred save whose
    /// generation no longer matches was superseded and must not write.
    generation: u64,
}

struct ConfigEntry {
    namespace: String,
    file_name: String,
    path: PathBuf,
    node: ConfigNode,
    handles: Arc<dyn Any + Send + Sync>,
    codec: Arc<dyn ConfigCodec>,
    pending: Mutex<PendingSave>,
    debounce: Duration,
    runtime: Handle,
}

impl ConfigEntry {
    fn id(&self) -> String {
        format!("{}:{}", self.namespace, self.file_name)
    }

    /// Loads the backing file into the tree, or creates it with defaults.
    ///
    /// Failures here are logged and recovered: the tree keeps whatever
    /// state it reached (defaults if the load failed entirely).
    async fn load_or_create(&self) {
        if self.path.exists() {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(data) => match self.codec.decode(&data, &self.node) {
                    // Rewriting immediately normalizes the on-disk form and
                    // drops keys that were absent on load.
                    Ok(()) => self.write_initial().await,
                    Err(e) => warn!(
                        config = %self.id(),
                        error = %e,
                        "Could not decode config file, keeping defaults"
                    ),
                },
                Err(e) => error!(
                    config = %self.id(),
                    error = %e,
                    "Could not read config file, keeping defaults"
                ),
            }
        } else {
            info!(config = %self.id(), "Config file not found, creating a new one");
            self.write_initial().await;
        }
    }

    async fn write_initial(&self) {
        let encoded = match self.codec.encode(&self.node) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(config = %self.id(), error = %e, "Could not encode config");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!(
                    path = %parent.display(),
                    error = %e,
                    "Failed to create config directory"
                );
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, encoded).await {
            error!(config = %self.id(), error = %e, "Could not write config file");
        }
    }

    /// Debounces a save: cancels the scheduled one, if any, and starts a
    /// fresh deferred task. Called from the tree's save hook on every
    /// mutation, from any thread.
    fn schedule(self: Arc<Self>) {
        let mut pending = self.pending.lock();
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        pending.generation += 1;
        let generation = pending.generation;
        let entry = Arc::clone(&self);
        pending.task = Some(self.runtime.spawn(async move {
            tokio::time::sleep(entry.debounce).await;
            entry.commit(generation);
        }));
    }

    /// Performs a deferred save unless it was superseded while waiting for
    /// the entry lock.
    fn commit(&self, generation: u64) {
        let mut pending = self.pending.lock();
        if pending.generation != generation {
            return;
        }
        pending.task = None;
        self.write_blocking();
    }

    /// Cancels any pending save and writes immediately. Cancelling a task
    /// that already ran is a no-op; bumping the generation also stops a
    /// deferred save that is past its sleep but has not taken the lock yet.
    fn flush(&self) {
        let mut pending = self.pending.lock();
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        pending.generation += 1;
        self.write_blocking();
    }

    /// The write itself, performed under the entry lock. Expected to be
    /// quick relative to the debounce window. An I/O failure is logged and
    /// the attempt skipped; the next scheduled save retries.
    fn write_blocking(&self) {
        let encoded = match self.codec.encode(&self.node) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(config = %self.id(), error = %e, "Could not encode config");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!(
                    path = %parent.display(),
                    error = %e,
                    "Failed to create config directory"
                );
                return;
            }
        }
        match std::fs::write(&self.path, encoded) {
            Ok(()) => debug!(config = %self.id(), "Persisted config"),
            Err(e) => error!(config = %self.id(), error = %e, "Could not write config file"),
        }
    }

    fn has_pending(&self) -> bool {
        self.pending.lock().task.is_some()
    }
}

// ─── ConfigRegistry ───────────────────────────────────────────────────────────

/// Owns the set of initialized config trees and drives their persistence.
pub struct ConfigRegistry {
    storage_root: PathBuf,
    codecs: CodecRegistry,
    /// Registration order is preserved; `flush_all` drains in this order.
    entries: RwLock<Vec<Arc<ConfigEntry>>>,
    debounce: Duration,
}

impl ConfigRegistry {
    /// Creates a registry rooted at `storage_root`.
    ///
    /// The reference JSON codec comes pre-registered; add further formats
    /// with [`register_codec`](Self::register_codec) before
    /// [`initialize`](Self::initialize).
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        let codecs = CodecRegistry::new();
        // A fresh registry cannot collide on the built-in extension.
        let _ = codecs.register(Arc::new(JsonCodec));
        Self {
            storage_root: storage_root.into(),
            codecs,
            entries: RwLock::new(Vec::new()),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Overrides the debounce window (default 800 ms).
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// The storage root all namespaces live under.
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Registers an additional codec.
    ///
    /// # Errors
    ///
    /// [`CodecError::DuplicateExtension`] if the extension already has a
    /// codec: fail fast, never silently overwrite.
    pub fn register_codec(&self, codec: Arc<dyn ConfigCodec>) -> CodecResult<()> {
        self.codecs.register(codec)
    }

    /// The registered codec extensions.
    pub fn extensions(&self) -> Vec<String> {
        self.codecs.extensions()
    }

    /// Assembles, loads and registers every descriptor.
    ///
    /// Failures are per-descriptor: a schema error, unknown extension or
    /// duplicate registration aborts that descriptor only, with an error
    /// log. I/O and decode failures do not even do that: the tree is
    /// registered and keeps running on whatever state it reached.
    pub async fn initialize(&self, descriptors: Vec<ConfigDescriptor>) {
        info!(count = descriptors.len(), "Initializing configs");
        debug!(extensions = ?self.extensions(), "Available codec extensions");
        for descriptor in descriptors {
            if let Err(e) = self.init_descriptor(&descriptor).await {
                error!(
                    config = %format!("{}:{}", descriptor.namespace(), descriptor.file_name()),
                    error = %e,
                    "Failed to initialize config"
                );
            }
        }
    }

    async fn init_descriptor(&self, descriptor: &ConfigDescriptor) -> RegistryResult<()> {
        let namespace = descriptor.namespace();
        let file_name = descriptor.file_name();
        info!(config = %format!("{namespace}:{file_name}"), "Loading config");

        if self.get(namespace, file_name).is_some() {
            return Err(RegistryError::DuplicateEntry(format!(
                "{namespace}:{file_name}"
            )));
        }

        let (built, handles) = descriptor.instantiate();
        let node = built?;
        let codec = self
            .codecs
            .get(descriptor.extension())
            .ok_or_else(|| CodecError::UnknownExtension(descriptor.extension().to_string()))?;

        let entry = Arc::new(ConfigEntry {
            namespace: namespace.to_string(),
            file_name: file_name.to_string(),
            path: self.storage_root.join(namespace).join(file_name),
            node: node.clone(),
            handles: handles.into(),
            codec,
            pending: Mutex::new(PendingSave::default()),
            debounce: self.debounce,
            runtime: Handle::current(),
        });

        entry.load_or_create().await;

        // From here on, every mutation anywhere in the tree lands in the
        // debounce pipeline. Installing the hook only now keeps the
        // codec-driven writes above from scheduling saves.
        let hooked = Arc::clone(&entry);
        node.save_signal().install(move || Arc::clone(&hooked).schedule());

        self.entries.write().push(entry);
        Ok(())
    }

    /// Direct lookup of a loaded tree. Absence is `None`, not an error.
    pub fn get(&self, namespace: &str, file_name: &str) -> Option<ConfigNode> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.namespace == namespace && entry.file_name == file_name)
            .map(|entry| entry.node.clone())
    }

    /// The typed handles declared by a schema type, if it was initialized.
    pub fn handles<T: ConfigSchema>(&self) -> Option<Arc<T>> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.namespace == T::NAMESPACE && entry.file_name == T::FILE_NAME)
            .and_then(|entry| Arc::clone(&entry.handles).downcast::<T>().ok())
    }

    /// Synchronously cancels every pending save and writes every tree, in
    /// registration order. The single point that guarantees no data-loss
    /// window remains open; call it during shutdown.
    pub fn flush_all(&self) {
        let entries: Vec<_> = self.entries.read().iter().cloned().collect();
        info!(count = entries.len(), "Flushing all configs");
        for entry in entries {
            entry.flush();
        }
    }

    /// Returns statistics about the registry.
    pub fn stats(&self) -> RegistryStats {
        let entries = self.entries.read();
        RegistryStats {
            entries: entries.len(),
            pending_saves: entries.iter().filter(|entry| entry.has_pending()).count(),
        }
    }
}

/// Statistics about the config registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of initialized configs.
    pub entries: usize,
    /// Number of configs with a save currently scheduled.
    pub pending_saves: usize,
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Configs: {} total, {} with pending saves",
            self.entries, self.pending_saves
        )
    }
}
