//! # Restart-Aware Service Lifecycle
//!
//! The installer replays full model snapshots into running services; the
//! controller decides, per attribute write, between in-place application,
//! recreation of the owning subtree, and recreation of the whole container,
//! with a compensating recover path when a recreate's commit phase fails.

pub mod controller;
pub mod installer;

pub use controller::LifecycleController;
pub use installer::ServiceInstaller;
