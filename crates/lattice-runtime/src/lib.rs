//! Lattice Runtime - Orchestration layer for the Lattice config framework.
//!
//! This crate provides:
//! - Config lifecycle management ([`ConfigRegistry`])
//! - Schema declaration ([`ConfigSchema`], [`ConfigDescriptor`])
//! - Debounced, coalesced writeback with a synchronous shutdown flush
//! - Logging configuration ([`logging`])
//!
//! # Lifecycle
//!
//! ```text
//! initialize ──▶ load-or-create ──▶ Loaded ──mutation──▶ SaveScheduled
//!                                     ▲                       │ debounce
//!                                     └───────── write ◀──────┘
//!                                  flush_all ──▶ drained (shutdown)
//! ```
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
//!     // …later, during shutdown:
//!     registry.flush_all();
//! }
//! ```

pub mod descriptor;
pub mod error;
pub mod logging;
pub mod registry;

// Re-exports
pub use descriptor::{ConfigDescriptor, ConfigSchema};
pub use error::{RegistryError, RegistryResult};
pub use logging::{LogFormat, LoggingBuilder};
pub use registry::{ConfigRegistry, DEFAULT_DEBOUNCE, RegistryStats};
