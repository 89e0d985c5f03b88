//! # Lattice Core
//!
//! The core tree model of the Lattice configuration framework: a
//! self-describing, nested schema of named values and named sub-nodes that
//! stays eventually consistent with its on-disk representation.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐  declares   ┌─────────────┐  walks   ┌─────────────┐
//! │  NodeBuilder  │────────────▶│ ConfigNode  │◀─────────│ ConfigCodec │
//! │ (host schema) │   handles   │  + cells    │          │ (per format)│
//! └───────┬───────┘             └──────┬──────┘          └─────────────┘
//!         │                           mutation
//!         ▼                            ▼
//!   OptionHandle / ListHandle     SaveSignal ──▶ registry debounce hook
//! ```
//!
//! - **Value model** ([`value`]): tagged [`ConfigValue`] variants validated
//!   against per-option [`ValueDescriptor`]s, so an invalid conversion is a
//!   checked branch, not a cast failure.
//! - **Option cells** ([`option`]): named, typed, mutable leaves carrying a
//!   default and a load-presence flag; every successful mutation reports
//!   upward through the tree's shared [`SaveSignal`].
//! - **Typed handles** ([`handle`]): the host-facing live views returned at
//!   declaration time.
//! - **Composite nodes** ([`node`]): assembled exactly once by
//!   [`NodeBuilder`], enumerated in declaration order, addressed by dotted
//!   paths.
//! - **Codec contract** ([`codec`]): pluggable per-format serialization
//!   plus the extension registry.
//!
//! Persistence scheduling (debounced, coalesced writeback) lives in
//! `lattice-runtime`; the reference JSON codec lives in
//! `lattice-codec-json`.

pub mod codec;
pub mod error;
pub mod handle;
pub mod node;
pub mod option;
pub mod value;

// Re-exports
pub use codec::{CodecRegistry, ConfigCodec};
pub use error::{CodecError, CodecResult, SchemaError, SchemaResult};
pub use handle::{ListHandle, NodeListHandle, OptionHandle};
pub use node::{ConfigNode, NodeBuilder};
pub use option::{OptionCell, SaveSignal};
pub use value::{ConfigValue, ElementKind, ScalarKind, ScalarValue, ValueDescriptor, ValueKind};
