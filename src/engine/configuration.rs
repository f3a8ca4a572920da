//! Cache configuration objects and their builder.
//!
//! Structural attributes are fixed once built; the slots that may legally be
//! tuned on a live cache sit in [`RuntimeSettings`] behind a lock, so a write
//! is immediately visible to subsequent reads without a rebuild.

use crate::engine::persistence::{PersistenceConfiguration, StoreConfiguration};
use crate::engine::BuildError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Resolved clustering mode of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Local,
    ReplicatedSync,
    ReplicatedAsync,
    DistributedSync,
    DistributedAsync,
    InvalidationSync,
    InvalidationAsync,
}

impl CacheMode {
    pub fn is_clustered(&self) -> bool {
        *self != Self::Local
    }

    pub fn is_synchronous(&self) -> bool {
        matches!(
            self,
            Self::ReplicatedSync | Self::DistributedSync | Self::InvalidationSync
        )
    }

    pub fn is_distributed(&self) -> bool {
        matches!(self, Self::DistributedSync | Self::DistributedAsync)
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "LOCAL",
            Self::ReplicatedSync => "REPL_SYNC",
            Self::ReplicatedAsync => "REPL_ASYNC",
            Self::DistributedSync => "DIST_SYNC",
            Self::DistributedAsync => "DIST_ASYNC",
            Self::InvalidationSync => "INVALIDATION_SYNC",
            Self::InvalidationAsync => "INVALIDATION_ASYNC",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsolationLevel {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionMode {
    None,
    Batch,
    NonXa,
    NonDurableXa,
    FullXa,
}

impl TransactionMode {
    pub fn is_transactional(&self) -> bool {
        *self != Self::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionLocking {
    Optimistic,
    Pessimistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    Object,
    Binary,
    OffHeap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvictionType {
    Count,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartMode {
    Eager,
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockingConfiguration {
    pub isolation: IsolationLevel,
    pub striping: bool,
    pub concurrency_level: i64,
}

impl Default for LockingConfiguration {
    fn default() -> Self {
        Self {
            isolation: IsolationLevel::ReadCommitted,
            striping: false,
            concurrency_level: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionConfiguration {
    pub mode: TransactionMode,
    pub locking: TransactionLocking,
    pub notifications: bool,
}

impl Default for TransactionConfiguration {
    fn default() -> Self {
        Self {
            mode: TransactionMode::None,
            locking: TransactionLocking::Optimistic,
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirationConfiguration {
    /// Reaper wake-up interval in milliseconds; the reaper runs only for a
    /// positive interval.
    pub interval: i64,
}

impl ExpirationConfiguration {
    pub fn reaper_enabled(&self) -> bool {
        self.interval > 0
    }
}

impl Default for ExpirationConfiguration {
    fn default() -> Self {
        Self { interval: 60_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfiguration {
    pub storage: StorageType,
    pub eviction: EvictionType,
    /// Off-heap address table size; only meaningful for off-heap storage.
    pub address_count: Option<i64>,
}

impl Default for MemoryConfiguration {
    fn default() -> Self {
        Self {
            storage: StorageType::Object,
            eviction: EvictionType::Count,
            address_count: None,
        }
    }
}

/// Distribution tuning, present only for distributed modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionConfiguration {
    pub owners: i64,
    pub segments: i64,
    pub capacity_factor: f64,
    pub l1_lifespan: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationConfiguration {
    pub enabled: bool,
    pub roles: Vec<String>,
}

/// The slots that may be changed on a running cache without a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Eviction bound; -1 disables eviction.
    pub memory_size: i64,
    /// Entry lifespan in milliseconds; -1 disables.
    pub lifespan: i64,
    /// Maximum idle time in milliseconds; -1 disables.
    pub max_idle: i64,
    /// Lock acquisition timeout in milliseconds.
    pub acquire_timeout: i64,
    /// Cache stop timeout in milliseconds.
    pub stop_timeout: i64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            memory_size: -1,
            lifespan: -1,
            max_idle: -1,
            acquire_timeout: 15_000,
            stop_timeout: 30_000,
        }
    }
}

/// A built cache configuration. Structural sections are immutable; the
/// runtime section is shared with the live cache and tunable in place.
#[derive(Debug, Clone)]
pub struct CacheConfiguration {
    mode: CacheMode,
    template: bool,
    statistics: bool,
    batching: bool,
    remote_timeout: Option<i64>,
    locking: LockingConfiguration,
    transaction: TransactionConfiguration,
    expiration: ExpirationConfiguration,
    memory: MemoryConfiguration,
    distribution: Option<DistributionConfiguration>,
    authorization: Option<AuthorizationConfiguration>,
    persistence: PersistenceConfiguration,
    runtime: Arc<RwLock<RuntimeSettings>>,
}

impl CacheConfiguration {
    pub fn builder(mode: CacheMode) -> CacheConfigurationBuilder {
        CacheConfigurationBuilder::new(mode)
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn template(&self) -> bool {
        self.template
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }

    pub fn batching(&self) -> bool {
        self.batching
    }

    pub fn remote_timeout(&self) -> Option<i64> {
        self.remote_timeout
    }

    pub fn locking(&self) -> &LockingConfiguration {
        &self.locking
    }

    pub fn transaction(&self) -> &TransactionConfiguration {
        &self.transaction
    }

    pub fn expiration(&self) -> &ExpirationConfiguration {
        &self.expiration
    }

    pub fn memory(&self) -> &MemoryConfiguration {
        &self.memory
    }

    pub fn distribution(&self) -> Option<&DistributionConfiguration> {
        self.distribution.as_ref()
    }

    pub fn authorization(&self) -> Option<&AuthorizationConfiguration> {
        self.authorization.as_ref()
    }

    pub fn persistence(&self) -> &PersistenceConfiguration {
        &self.persistence
    }

    pub fn runtime(&self) -> RuntimeSettings {
        self.runtime.read().clone()
    }

    pub fn update_runtime<F>(&self, mutate: F)
    where
        F: FnOnce(&mut RuntimeSettings),
    {
        let mut settings = self.runtime.write();
        mutate(&mut settings);
    }

    /// Full value snapshot, runtime settings included. Two configurations
    /// built from identical models snapshot identically.
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "mode": self.mode,
            "template": self.template,
            "statistics": self.statistics,
            "batching": self.batching,
            "remote_timeout": self.remote_timeout,
            "locking": self.locking,
            "transaction": self.transaction,
            "expiration": self.expiration,
            "memory": self.memory,
            "distribution": self.distribution,
            "authorization": self.authorization,
            "persistence": self.persistence,
            "runtime": self.runtime.read().clone(),
        })
    }
}

/// Builder with structural validation at build time.
#[derive(Debug, Clone)]
pub struct CacheConfigurationBuilder {
    mode: CacheMode,
    template: bool,
    statistics: bool,
    batching: bool,
    remote_timeout: Option<i64>,
    locking: LockingConfiguration,
    transaction: TransactionConfiguration,
    expiration: ExpirationConfiguration,
    memory: MemoryConfiguration,
    distribution: Option<DistributionConfiguration>,
    authorization: Option<AuthorizationConfiguration>,
    persistence: PersistenceConfiguration,
    runtime: RuntimeSettings,
}

impl CacheConfigurationBuilder {
    pub fn new(mode: CacheMode) -> Self {
        Self {
            mode,
            template: false,
            statistics: true,
            batching: false,
            remote_timeout: None,
            locking: LockingConfiguration::default(),
            transaction: TransactionConfiguration::default(),
            expiration: ExpirationConfiguration::default(),
            memory: MemoryConfiguration::default(),
            distribution: None,
            authorization: None,
            persistence: PersistenceConfiguration::default(),
            runtime: RuntimeSettings::default(),
        }
    }

    pub fn template(mut self, template: bool) -> Self {
        self.template = template;
        self
    }

    pub fn statistics(mut self, statistics: bool) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn batching(mut self, batching: bool) -> Self {
        self.batching = batching;
        if batching {
            self.transaction.mode = TransactionMode::Batch;
        }
        self
    }

    pub fn remote_timeout(mut self, timeout: i64) -> Self {
        self.remote_timeout = Some(timeout);
        self
    }

    pub fn locking(mut self, locking: LockingConfiguration) -> Self {
        self.locking = locking;
        self
    }

    pub fn transaction(mut self, transaction: TransactionConfiguration) -> Self {
        self.transaction = transaction;
        self
    }

    pub fn expiration(mut self, expiration: ExpirationConfiguration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn memory(mut self, memory: MemoryConfiguration) -> Self {
        self.memory = memory;
        self
    }

    pub fn distribution(mut self, distribution: DistributionConfiguration) -> Self {
        self.distribution = Some(distribution);
        self
    }

    pub fn authorization(mut self, authorization: AuthorizationConfiguration) -> Self {
        self.authorization = Some(authorization);
        self
    }

    pub fn add_store(mut self, store: StoreConfiguration) -> Self {
        self.persistence.stores.push(store);
        self
    }

    pub fn passivation(mut self, passivation: bool) -> Self {
        self.persistence.passivation = passivation;
        self
    }

    pub fn runtime_settings(mut self, runtime: RuntimeSettings) -> Self {
        self.runtime = runtime;
        self
    }

    /// Build the configuration, rejecting structurally invalid combinations.
    pub fn build(self) -> Result<CacheConfiguration, BuildError> {
        if self.remote_timeout.is_some() && !self.mode.is_synchronous() {
            return Err(BuildError::Incompatible(format!(
                "remote timeout requires a synchronous clustered mode, mode is {}",
                self.mode
            )));
        }
        if self.distribution.is_some() && !self.mode.is_distributed() {
            return Err(BuildError::Incompatible(format!(
                "distribution tuning requires a distributed mode, mode is {}",
                self.mode
            )));
        }
        if self.memory.address_count.is_some() && self.memory.storage != StorageType::OffHeap {
            return Err(BuildError::Incompatible(
                "address count is only valid for off-heap storage".to_string(),
            ));
        }
        if self.batching && self.transaction.mode != TransactionMode::Batch {
            return Err(BuildError::Incompatible(
                "invocation batching requires the batch transaction mode".to_string(),
            ));
        }
        if self.persistence.passivation && self.persistence.stores.iter().any(|s| s.shared) {
            return Err(BuildError::Incompatible(
                "passivation cannot be combined with a shared store".to_string(),
            ));
        }
        for store in &self.persistence.stores {
            store.validate()?;
        }

        Ok(CacheConfiguration {
            mode: self.mode,
            template: self.template,
            statistics: self.statistics,
            batching: self.batching,
            remote_timeout: self.remote_timeout,
            locking: self.locking,
            transaction: self.transaction,
            expiration: self.expiration,
            memory: self.memory,
            distribution: self.distribution,
            authorization: self.authorization,
            persistence: self.persistence,
            runtime: Arc::new(RwLock::new(self.runtime)),
        })
    }
}

/// Container-level transport section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfiguration {
    pub stack: String,
    pub cluster: String,
    pub lock_timeout: i64,
    pub initial_cluster_size: i64,
}

/// Container-level (global) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfiguration {
    pub default_cache: Option<String>,
    pub statistics: bool,
    pub start: StartMode,
    pub aliases: Vec<String>,
    pub transport: Option<TransportConfiguration>,
}

impl ContainerConfiguration {
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("container configuration serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_timeout_requires_sync_mode() {
        let err = CacheConfiguration::builder(CacheMode::ReplicatedAsync)
            .remote_timeout(17_500)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("synchronous"));

        assert!(CacheConfiguration::builder(CacheMode::ReplicatedSync)
            .remote_timeout(17_500)
            .build()
            .is_ok());
    }

    #[test]
    fn address_count_requires_off_heap() {
        let memory = MemoryConfiguration {
            storage: StorageType::Object,
            eviction: EvictionType::Count,
            address_count: Some(1 << 20),
        };
        assert!(CacheConfiguration::builder(CacheMode::Local)
            .memory(memory)
            .build()
            .is_err());
    }

    #[test]
    fn batching_forces_batch_transactions() {
        let config = CacheConfiguration::builder(CacheMode::Local)
            .batching(true)
            .build()
            .unwrap();
        assert_eq!(config.transaction().mode, TransactionMode::Batch);
    }

    #[test]
    fn runtime_updates_are_visible_immediately() {
        let config = CacheConfiguration::builder(CacheMode::Local).build().unwrap();
        assert_eq!(config.runtime().memory_size, -1);
        config.update_runtime(|s| s.memory_size = 2_000);
        assert_eq!(config.runtime().memory_size, 2_000);
    }

    #[test]
    fn identical_builders_snapshot_identically() {
        let build = || {
            CacheConfiguration::builder(CacheMode::DistributedSync)
                .remote_timeout(17_500)
                .distribution(DistributionConfiguration {
                    owners: 2,
                    segments: 256,
                    capacity_factor: 1.0,
                    l1_lifespan: 0,
                })
                .build()
                .unwrap()
        };
        assert_eq!(build().snapshot(), build().snapshot());
    }
}
