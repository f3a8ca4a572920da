//! Hierarchical service names derived from resource paths.

use crate::model::path::{ResourceKind, ResourcePath};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a service unit in the container, e.g. `cachegrid.web` for a
/// container and `cachegrid.web.sessions` for a cache inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceName(Vec<String>);

impl ServiceName {
    const ROOT: &'static str = "cachegrid";

    pub fn container(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn cache(container: impl Into<String>, cache: impl Into<String>) -> Self {
        Self(vec![container.into(), cache.into()])
    }

    /// Service name for a path whose final segment owns a service. Paths of
    /// sub-resources resolve through [`ResourcePath::owning_service_path`]
    /// first.
    pub fn from_path(path: &ResourcePath) -> Option<Self> {
        let segments = path.segments();
        match segments {
            [container] if container.kind == ResourceKind::CacheContainer => {
                Some(Self::container(container.name.clone()))
            }
            [container, cache]
                if container.kind == ResourceKind::CacheContainer && cache.kind.is_cache() =>
            {
                Some(Self::cache(container.name.clone(), cache.name.clone()))
            }
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.0.len() == 1
    }

    pub fn container_name(&self) -> &str {
        &self.0[0]
    }

    pub fn cache_name(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// The container service this service belongs to (itself, for a
    /// container service).
    pub fn owning_container(&self) -> ServiceName {
        Self::container(self.0[0].clone())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", Self::ROOT, self.0.join("."))
    }
}
