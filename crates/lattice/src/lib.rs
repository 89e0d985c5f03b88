//! # Lattice
//!
//! A self-describing configuration tree with pluggable persistence formats
//! and coalesced asynchronous writeback.
//!
//! ## Overview
//!
//! A host declares a nested schema of named values and named sub-nodes,
//! loads it from a storage backend (absent keys are tracked so they are
//! never re-written), and keeps the in-memory tree and on-disk form
//! eventually consistent on every mutation, without blocking the caller
//! on I/O.
//!
//! ```text
//! ┌──────────────┐  declare   ┌──────────────┐  decode/encode  ┌───────────┐
//! │ ConfigSchema │───────────▶│ ConfigNode   │◀───────────────▶│ Codec     │
//! │  (host type) │  handles   │  tree        │                 │ (.json,…) │
//! └──────┬───────┘            └──────┬───────┘                 └─────┬─────┘
//!        │ set()                     │ SaveSignal                    │
//!        ▼                           ▼                               ▼
//!   typed handles ─────────▶ ConfigRegistry ── debounce ──▶ <root>/<ns>/<file>
//! ```
//!
//! - **Mutate through typed handles**: every change schedules a debounced
//!   save; bursts collapse into one write.
//! - **Pluggable codecs**: one per file extension, the JSON reference codec
//!   pre-registered; a duplicate extension fails fast.
//! - **Graceful degradation**: ill-typed decoded values, missing files and
//!   I/O failures are logged and recovered, never raised to the mutating
//!   caller.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lattice::prelude::*;
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
//!         Self { name: builder.option("name", "test") }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ConfigRegistry::new("./config");
//!     registry.initialize(vec![ConfigDescriptor::of::<ExampleConfig>()]).await;
//!
//!     let config = registry.handles::<ExampleConfig>().unwrap();
//!     config.name.set("changed".to_string());
//!
//!     registry.flush_all();
//! }
//! ```

pub use lattice_codec_json as codec_json;
pub use lattice_core as core;
pub use lattice_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use lattice_codec_json::JsonCodec;
    pub use lattice_core::{
        ConfigCodec, ConfigNode, ConfigValue, ListHandle, NodeBuilder, NodeListHandle,
        OptionHandle,
    };
    pub use lattice_runtime::{ConfigDescriptor, ConfigRegistry, ConfigSchema, LoggingBuilder};
}
