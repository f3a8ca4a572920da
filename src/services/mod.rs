//! # Service Container
//!
//! Named service units backing configuration nodes: a per-service lifecycle
//! state machine, an explicit dependency DAG with ordered stop/start walks,
//! and awaited asynchronous start/stop.

pub mod container;
pub mod graph;
pub mod name;
pub mod state;

pub use container::{ServiceContainer, ServiceHandle, ServiceRuntime};
pub use graph::DependencyGraph;
pub use name::ServiceName;
pub use state::{determine_target_state, ServiceEvent, ServiceState};
