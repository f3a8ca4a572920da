//! # Declarative Bootstrap
//!
//! YAML definitions of cache containers and caches, validated and replayed
//! as add operations against a fresh management core. This is how a server
//! configuration file materializes into the stored model and its services.

pub mod loader;

pub use loader::{BootstrapDefinition, CacheDefinition, ContainerDefinition, StoreDefinition};
