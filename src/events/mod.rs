//! # Lifecycle Event System
//!
//! Broadcast channel carrying service lifecycle transitions and management
//! operation outcomes to any interested subscriber.

pub mod publisher;

pub use publisher::{EventPublisher, LifecycleEvent};

/// Well-known event names published by the core.
pub mod names {
    pub const SERVICE_INSTALLING: &str = "service.installing";
    pub const SERVICE_RUNNING: &str = "service.running";
    pub const SERVICE_STOPPING: &str = "service.stopping";
    pub const SERVICE_UNINSTALLED: &str = "service.uninstalled";
    pub const OPERATION_COMPLETED: &str = "operation.completed";
    pub const OPERATION_FAILED: &str = "operation.failed";
    pub const OPERATION_RECOVERED: &str = "operation.recovered";
}
