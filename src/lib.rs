#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # CacheGrid Core
//!
//! Management core for embedded cache containers: a declarative
//! configuration model, a restart-aware service lifecycle, and runtime
//! metrics over the live caches.
//!
//! ## Overview
//!
//! The crate translates a declarative description of cache containers,
//! caches, stores, and their tunables into running embedded-cache services,
//! and reflects runtime statistics back into the model. Three layers
//! cooperate:
//!
//! - [`catalog`] - static attribute descriptors: type, default, validation
//!   rule, and restart classification per logical key
//! - [`model`] - the stored configuration tree the management operations
//!   mutate
//! - [`lifecycle`] - the restart-aware controller: apply a change in place,
//!   recreate the owning subtree, or recreate the whole container, with a
//!   compensating recover path
//!
//! Around them: [`translator`] turns validated model subtrees into engine
//! configuration objects, [`services`] runs the dependency-ordered service
//! container, [`metrics`] exposes read-only runtime values, [`events`]
//! broadcasts lifecycle transitions, and [`config`] replays YAML bootstrap
//! definitions as management operations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachegrid_core::catalog::AttributeValue;
//! use cachegrid_core::management::{ManagementCore, Operation};
//! use cachegrid_core::model::ResourcePath;
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> cachegrid_core::error::Result<()> {
//! let core = ManagementCore::new();
//!
//! // Register a container, then a cache inside it.
//! let container: ResourcePath = "cache-container=web".parse()?;
//! core.execute(Operation::add(container.clone(), BTreeMap::new())).await?;
//!
//! let cache: ResourcePath = "cache-container=web/local-cache=sessions".parse()?;
//! core.execute(Operation::add(cache.clone(), BTreeMap::new())).await?;
//!
//! // A write to a live-tunable slot applies without a restart.
//! let memory: ResourcePath = "cache-container=web/local-cache=sessions/memory=memory".parse()?;
//! core.execute(Operation::add(memory.clone(), BTreeMap::new())).await?;
//! core.execute(Operation::write_attribute(memory, "size", AttributeValue::Long(2_000))).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod management;
pub mod metrics;
pub mod model;
pub mod services;
pub mod translator;

pub use catalog::{AttributeValue, Catalog, RestartClassification};
pub use error::{ManagementError, Result};
pub use management::{ManagementCore, Operation, OperationKind, OperationResponse};
pub use model::{ConfigurationNode, ConfigurationTree, ResourceKind, ResourcePath};
pub use services::{ServiceName, ServiceState};
