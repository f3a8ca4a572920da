//! Live runtime objects: the embedded container and its caches.
//!
//! These are the materialized counterparts of configuration nodes. The
//! management layer owns their lifecycle; the data-path internals of the
//! engine stay out of scope here, statistics counters included only so the
//! metric readers have something real to report.

use crate::engine::configuration::{CacheConfiguration, ContainerConfiguration};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Engine-side component status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentStatus {
    Instantiated,
    Running,
    Terminated,
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instantiated => "INSTANTIATED",
            Self::Running => "RUNNING",
            Self::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// Aggregate health of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => f.write_str("HEALTHY"),
            Self::Degraded => f.write_str("DEGRADED"),
        }
    }
}

/// Per-cache statistics counters.
#[derive(Debug, Default)]
pub struct CacheStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    evictions: AtomicU64,
    read_time_millis: AtomicU64,
    write_time_millis: AtomicU64,
}

impl CacheStatistics {
    pub fn record_hit(&self, read_millis: u64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.read_time_millis.fetch_add(read_millis, Ordering::Relaxed);
    }

    pub fn record_miss(&self, read_millis: u64) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.read_time_millis.fetch_add(read_millis, Ordering::Relaxed);
    }

    pub fn record_store(&self, write_millis: u64) {
        self.stores.fetch_add(1, Ordering::Relaxed);
        self.write_time_millis.fetch_add(write_millis, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn stores(&self) -> u64 {
        self.stores.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    pub fn average_read_time(&self) -> u64 {
        let reads = self.hits() + self.misses();
        if reads == 0 {
            0
        } else {
            self.read_time_millis.load(Ordering::Relaxed) / reads
        }
    }

    pub fn average_write_time(&self) -> u64 {
        let writes = self.stores();
        if writes == 0 {
            0
        } else {
            self.write_time_millis.load(Ordering::Relaxed) / writes
        }
    }
}

/// A live cache instance.
#[derive(Debug)]
pub struct CacheRuntime {
    name: String,
    configuration: CacheConfiguration,
    statistics: CacheStatistics,
    status: RwLock<ComponentStatus>,
    started_at: RwLock<Option<DateTime<Utc>>>,
    entries: AtomicU64,
}

impl CacheRuntime {
    pub fn new(name: impl Into<String>, configuration: CacheConfiguration) -> Self {
        Self {
            name: name.into(),
            configuration,
            statistics: CacheStatistics::default(),
            status: RwLock::new(ComponentStatus::Instantiated),
            started_at: RwLock::new(None),
            entries: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &CacheConfiguration {
        &self.configuration
    }

    pub fn statistics(&self) -> &CacheStatistics {
        &self.statistics
    }

    pub fn status(&self) -> ComponentStatus {
        *self.status.read()
    }

    pub fn is_running(&self) -> bool {
        self.status() == ComponentStatus::Running
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.read()
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }

    pub fn set_entry_count(&self, entries: u64) {
        self.entries.store(entries, Ordering::Relaxed);
    }

    pub(crate) fn start(&self) {
        *self.status.write() = ComponentStatus::Running;
        *self.started_at.write() = Some(Utc::now());
    }

    pub(crate) fn stop(&self) {
        *self.status.write() = ComponentStatus::Terminated;
        *self.started_at.write() = None;
    }
}

/// The embedded cache manager: one per container node.
#[derive(Debug)]
pub struct CacheContainerRuntime {
    name: String,
    configuration: ContainerConfiguration,
    status: RwLock<ComponentStatus>,
    started_at: RwLock<Option<DateTime<Utc>>>,
    caches: DashMap<String, Arc<CacheRuntime>>,
    local_node: String,
}

impl CacheContainerRuntime {
    pub fn new(name: impl Into<String>, configuration: ContainerConfiguration) -> Self {
        let name = name.into();
        let local_node = match &configuration.transport {
            Some(transport) => format!("{}-{}-1", transport.cluster, name),
            None => format!("{name}-local"),
        };
        Self {
            name,
            configuration,
            status: RwLock::new(ComponentStatus::Instantiated),
            started_at: RwLock::new(None),
            caches: DashMap::new(),
            local_node,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &ContainerConfiguration {
        &self.configuration
    }

    pub fn status(&self) -> ComponentStatus {
        *self.status.read()
    }

    pub fn is_running(&self) -> bool {
        self.status() == ComponentStatus::Running
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.read()
    }

    /// Cluster membership as seen by this node. A container without
    /// transport runs standalone and reports only itself.
    pub fn members(&self) -> Vec<String> {
        vec![self.local_node.clone()]
    }

    pub fn cluster_name(&self) -> Option<&str> {
        self.configuration.transport.as_ref().map(|t| t.cluster.as_str())
    }

    pub fn register_cache(&self, cache: Arc<CacheRuntime>) {
        self.caches.insert(cache.name().to_string(), cache);
    }

    pub fn unregister_cache(&self, name: &str) -> Option<Arc<CacheRuntime>> {
        self.caches.remove(name).map(|(_, cache)| cache)
    }

    pub fn cache(&self, name: &str) -> Option<Arc<CacheRuntime>> {
        self.caches.get(name).map(|entry| entry.value().clone())
    }

    pub fn cache_names(&self) -> Vec<String> {
        self.caches.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn defined_cache_count(&self) -> usize {
        self.caches.len()
    }

    pub fn running_cache_count(&self) -> usize {
        self.caches.iter().filter(|entry| entry.value().is_running()).count()
    }

    pub fn health(&self) -> HealthStatus {
        if self.is_running() && self.running_cache_count() == self.defined_cache_count() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }

    pub(crate) fn start(&self) {
        *self.status.write() = ComponentStatus::Running;
        *self.started_at.write() = Some(Utc::now());
    }

    pub(crate) fn stop(&self) {
        *self.status.write() = ComponentStatus::Terminated;
        *self.started_at.write() = None;
    }
}
