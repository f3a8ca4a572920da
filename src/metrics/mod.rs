//! # Runtime Metric Readers
//!
//! Read-only computed values over live runtime objects. Dispatch is an
//! immutable map from metric identifier to a reader capability built once at
//! startup; a metric read against a service that is not running returns the
//! explicit [`MetricValue::Unavailable`] sentinel, since lazy start makes
//! absence an expected steady state.

use crate::engine::runtime::{CacheContainerRuntime, CacheRuntime};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known metric identifiers.
pub mod ids {
    pub const CACHE_STATUS: &str = "cache-status";
    pub const HITS: &str = "hits";
    pub const MISSES: &str = "misses";
    pub const HIT_RATIO: &str = "hit-ratio";
    pub const STORES: &str = "stores";
    pub const EVICTIONS: &str = "evictions";
    pub const NUMBER_OF_ENTRIES: &str = "number-of-entries";
    pub const AVERAGE_READ_TIME: &str = "average-read-time";
    pub const AVERAGE_WRITE_TIME: &str = "average-write-time";
    pub const TIME_SINCE_START: &str = "time-since-start";

    pub const CACHE_MANAGER_STATUS: &str = "cache-manager-status";
    pub const CLUSTER_NAME: &str = "cluster-name";
    pub const MEMBERS: &str = "members";
    pub const DEFINED_CACHE_COUNT: &str = "defined-cache-count";
    pub const RUNNING_CACHE_COUNT: &str = "running-cache-count";
    pub const HEALTH: &str = "health";
}

/// Result of a metric read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Long(i64),
    Double(f64),
    Text(String),
    List(Vec<String>),
    /// The backing service is not running; not an error.
    Unavailable,
}

impl MetricValue {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            Self::Long(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::List(values) => write!(f, "[{}]", values.join(", ")),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// What a reader runs against.
pub enum MetricTarget<'a> {
    Cache(&'a CacheRuntime),
    Container(&'a CacheContainerRuntime),
}

impl MetricTarget<'_> {
    fn is_running(&self) -> bool {
        match self {
            Self::Cache(cache) => cache.is_running(),
            Self::Container(container) => container.is_running(),
        }
    }
}

type CacheReader = fn(&CacheRuntime) -> MetricValue;
type ContainerReader = fn(&CacheContainerRuntime) -> MetricValue;

/// Immutable metric-id -> reader tables, built once.
pub struct MetricRegistry {
    cache_readers: BTreeMap<&'static str, CacheReader>,
    container_readers: BTreeMap<&'static str, ContainerReader>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        let mut cache_readers: BTreeMap<&'static str, CacheReader> = BTreeMap::new();
        cache_readers.insert(ids::CACHE_STATUS, |cache| {
            MetricValue::Text(cache.status().to_string())
        });
        cache_readers.insert(ids::HITS, |cache| {
            MetricValue::Long(cache.statistics().hits() as i64)
        });
        cache_readers.insert(ids::MISSES, |cache| {
            MetricValue::Long(cache.statistics().misses() as i64)
        });
        cache_readers.insert(ids::HIT_RATIO, |cache| {
            MetricValue::Double(cache.statistics().hit_ratio())
        });
        cache_readers.insert(ids::STORES, |cache| {
            MetricValue::Long(cache.statistics().stores() as i64)
        });
        cache_readers.insert(ids::EVICTIONS, |cache| {
            MetricValue::Long(cache.statistics().evictions() as i64)
        });
        cache_readers.insert(ids::NUMBER_OF_ENTRIES, |cache| {
            MetricValue::Long(cache.entry_count() as i64)
        });
        cache_readers.insert(ids::AVERAGE_READ_TIME, |cache| {
            MetricValue::Long(cache.statistics().average_read_time() as i64)
        });
        cache_readers.insert(ids::AVERAGE_WRITE_TIME, |cache| {
            MetricValue::Long(cache.statistics().average_write_time() as i64)
        });
        cache_readers.insert(ids::TIME_SINCE_START, |cache| match cache.started_at() {
            Some(started_at) => {
                MetricValue::Long((Utc::now() - started_at).num_seconds().max(0))
            }
            None => MetricValue::Unavailable,
        });

        let mut container_readers: BTreeMap<&'static str, ContainerReader> = BTreeMap::new();
        container_readers.insert(ids::CACHE_MANAGER_STATUS, |container| {
            MetricValue::Text(container.status().to_string())
        });
        container_readers.insert(ids::CLUSTER_NAME, |container| {
            match container.cluster_name() {
                Some(cluster) => MetricValue::Text(cluster.to_string()),
                None => MetricValue::Unavailable,
            }
        });
        container_readers.insert(ids::MEMBERS, |container| {
            MetricValue::List(container.members())
        });
        container_readers.insert(ids::DEFINED_CACHE_COUNT, |container| {
            MetricValue::Long(container.defined_cache_count() as i64)
        });
        container_readers.insert(ids::RUNNING_CACHE_COUNT, |container| {
            MetricValue::Long(container.running_cache_count() as i64)
        });
        container_readers.insert(ids::HEALTH, |container| {
            MetricValue::Text(container.health().to_string())
        });

        Self {
            cache_readers,
            container_readers,
        }
    }

    /// Look up and invoke a reader. `None` means the metric does not exist
    /// for the target kind; `Some(Unavailable)` means the service is not
    /// running.
    pub fn read(&self, metric: &str, target: &MetricTarget<'_>) -> Option<MetricValue> {
        match target {
            MetricTarget::Cache(cache) => {
                let reader = self.cache_readers.get(metric)?;
                if !target.is_running() {
                    return Some(MetricValue::Unavailable);
                }
                Some(reader(cache))
            }
            MetricTarget::Container(container) => {
                let reader = self.container_readers.get(metric)?;
                if !target.is_running() {
                    return Some(MetricValue::Unavailable);
                }
                Some(reader(container))
            }
        }
    }

    pub fn has_cache_metric(&self, metric: &str) -> bool {
        self.cache_readers.contains_key(metric)
    }

    pub fn has_container_metric(&self, metric: &str) -> bool {
        self.container_readers.contains_key(metric)
    }

    pub fn cache_metric_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cache_readers.keys().copied()
    }

    pub fn container_metric_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.container_readers.keys().copied()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}
