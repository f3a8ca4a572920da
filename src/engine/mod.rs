//! # Embedded Cache Engine Facade
//!
//! The configuration-builder surface and runtime objects of the wrapped
//! cache engine. The management core drives this API the way it would drive
//! the real library: structural settings go through
//! [`CacheConfigurationBuilder`] and are frozen at build time, live-tunable
//! settings sit in [`configuration::RuntimeSettings`], and a build error is
//! what a service installation failure looks like from the outside.

pub mod configuration;
pub mod persistence;
pub mod runtime;

pub use configuration::{
    AuthorizationConfiguration, CacheConfiguration, CacheConfigurationBuilder, CacheMode,
    ContainerConfiguration, DistributionConfiguration, EvictionType, ExpirationConfiguration,
    IsolationLevel, LockingConfiguration, MemoryConfiguration, RuntimeSettings, StartMode,
    StorageType, TransactionConfiguration, TransactionLocking, TransactionMode,
    TransportConfiguration,
};
pub use persistence::{
    CompressionType, JdbcDialect, PersistenceConfiguration, StoreConfiguration, StoreKind,
};
pub use runtime::{CacheContainerRuntime, CacheRuntime, CacheStatistics, ComponentStatus, HealthStatus};

use thiserror::Error;

/// Structural validation failure raised while building a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("incompatible configuration: {0}")]
    Incompatible(String),
    #[error("missing required configuration: {0}")]
    Missing(String),
    #[error("no persistence provider registered under '{0}'")]
    UnknownProvider(String),
}
