//! Resource addressing: typed path segments and hierarchical paths.

use crate::error::{ManagementError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of configuration resources the management model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    CacheContainer,
    Transport,
    LocalCache,
    ReplicatedCache,
    DistributedCache,
    InvalidationCache,
    Locking,
    Transaction,
    Expiration,
    Memory,
    FileStore,
    JdbcStore,
    RemoteStore,
    RocksdbStore,
    CustomStore,
    Authorization,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheContainer => "cache-container",
            Self::Transport => "transport",
            Self::LocalCache => "local-cache",
            Self::ReplicatedCache => "replicated-cache",
            Self::DistributedCache => "distributed-cache",
            Self::InvalidationCache => "invalidation-cache",
            Self::Locking => "locking",
            Self::Transaction => "transaction",
            Self::Expiration => "expiration",
            Self::Memory => "memory",
            Self::FileStore => "file-store",
            Self::JdbcStore => "jdbc-store",
            Self::RemoteStore => "remote-store",
            Self::RocksdbStore => "rocksdb-store",
            Self::CustomStore => "custom-store",
            Self::Authorization => "authorization",
        }
    }

    /// True for the cache kinds addressable directly under a container.
    pub fn is_cache(&self) -> bool {
        matches!(
            self,
            Self::LocalCache | Self::ReplicatedCache | Self::DistributedCache | Self::InvalidationCache
        )
    }

    /// True for cache kinds that participate in a cluster.
    pub fn is_clustered_cache(&self) -> bool {
        matches!(
            self,
            Self::ReplicatedCache | Self::DistributedCache | Self::InvalidationCache
        )
    }

    pub fn is_store(&self) -> bool {
        matches!(
            self,
            Self::FileStore | Self::JdbcStore | Self::RemoteStore | Self::RocksdbStore | Self::CustomStore
        )
    }

    /// Whether a node of this kind is backed by its own running service.
    /// Sub-resources (locking, stores, ...) belong to the nearest such
    /// ancestor's service.
    pub fn owns_service(&self) -> bool {
        *self == Self::CacheContainer || self.is_cache()
    }

    /// Kinds allowed as children of this kind.
    pub fn allows_child(&self, child: ResourceKind) -> bool {
        match self {
            Self::CacheContainer => child == Self::Transport || child.is_cache(),
            kind if kind.is_cache() => matches!(
                child,
                Self::Locking | Self::Transaction | Self::Expiration | Self::Memory | Self::Authorization
            ) || child.is_store(),
            _ => false,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cache-container" => Ok(Self::CacheContainer),
            "transport" => Ok(Self::Transport),
            "local-cache" => Ok(Self::LocalCache),
            "replicated-cache" => Ok(Self::ReplicatedCache),
            "distributed-cache" => Ok(Self::DistributedCache),
            "invalidation-cache" => Ok(Self::InvalidationCache),
            "locking" => Ok(Self::Locking),
            "transaction" => Ok(Self::Transaction),
            "expiration" => Ok(Self::Expiration),
            "memory" => Ok(Self::Memory),
            "file-store" => Ok(Self::FileStore),
            "jdbc-store" => Ok(Self::JdbcStore),
            "remote-store" => Ok(Self::RemoteStore),
            "rocksdb-store" => Ok(Self::RocksdbStore),
            "custom-store" => Ok(Self::CustomStore),
            "authorization" => Ok(Self::Authorization),
            _ => Err(format!("Unknown resource kind: {s}")),
        }
    }
}

/// One `kind=name` element of a resource path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub kind: ResourceKind,
    pub name: String,
}

impl PathSegment {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Singleton sub-resources (locking, memory, ...) are addressed by their
    /// kind string.
    pub fn singleton(kind: ResourceKind) -> Self {
        Self {
            kind,
            name: kind.as_str().to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.name)
    }
}

/// An ordered sequence of path segments addressing one configuration node,
/// e.g. `cache-container=web/distributed-cache=sessions/memory=memory`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ResourcePath {
    segments: Vec<PathSegment>,
}

impl ResourcePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::new(vec![PathSegment::new(ResourceKind::CacheContainer, name)])
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        self.segments.last().map(|s| s.kind)
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.name.as_str())
    }

    /// Parent path, or `None` at the root.
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self::new(self.segments[..self.segments.len() - 1].to_vec()))
    }

    /// Extend this path with one more segment.
    pub fn child(&self, segment: PathSegment) -> ResourcePath {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self::new(segments)
    }

    /// True when `other` addresses this node or one of its descendants.
    pub fn contains(&self, other: &ResourcePath) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// The nearest prefix (possibly the path itself) whose kind owns a
    /// running service. The management model guarantees every non-root path
    /// hangs under a cache container, so this only returns `None` for the
    /// root itself.
    pub fn owning_service_path(&self) -> Option<ResourcePath> {
        for end in (1..=self.segments.len()).rev() {
            if self.segments[end - 1].kind.owns_service() {
                return Some(Self::new(self.segments[..end].to_vec()));
            }
        }
        None
    }

    /// The enclosing cache-container prefix, if any.
    pub fn container_path(&self) -> Option<ResourcePath> {
        self.segments
            .first()
            .filter(|s| s.kind == ResourceKind::CacheContainer)
            .map(|s| Self::new(vec![s.clone()]))
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for ResourcePath {
    type Err = ManagementError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "/" {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for part in s.trim_matches('/').split('/') {
            let (kind, name) = part.split_once('=').ok_or_else(|| {
                ManagementError::Configuration(format!("Malformed path segment '{part}'"))
            })?;
            let kind: ResourceKind = kind
                .parse()
                .map_err(ManagementError::Configuration)?;
            if name.is_empty() {
                return Err(ManagementError::Configuration(format!(
                    "Empty resource name in path segment '{part}'"
                )));
            }
            segments.push(PathSegment::new(kind, name));
        }
        Ok(Self::new(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display_round_trip() {
        let path: ResourcePath = "cache-container=web/distributed-cache=sessions/memory=memory"
            .parse()
            .unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.kind(), Some(ResourceKind::Memory));
        assert_eq!(
            path.to_string(),
            "cache-container=web/distributed-cache=sessions/memory=memory"
        );
    }

    #[test]
    fn owning_service_path_skips_sub_resources() {
        let path: ResourcePath = "cache-container=web/distributed-cache=sessions/memory=memory"
            .parse()
            .unwrap();
        let owner = path.owning_service_path().unwrap();
        assert_eq!(owner.to_string(), "cache-container=web/distributed-cache=sessions");

        let transport: ResourcePath = "cache-container=web/transport=transport".parse().unwrap();
        assert_eq!(
            transport.owning_service_path().unwrap().to_string(),
            "cache-container=web"
        );
    }

    #[test]
    fn malformed_paths_are_rejected() {
        assert!("cache-container".parse::<ResourcePath>().is_err());
        assert!("cache-container=".parse::<ResourcePath>().is_err());
        assert!("no-such-kind=x".parse::<ResourcePath>().is_err());
    }

    #[test]
    fn child_allowance() {
        assert!(ResourceKind::CacheContainer.allows_child(ResourceKind::DistributedCache));
        assert!(ResourceKind::DistributedCache.allows_child(ResourceKind::FileStore));
        assert!(!ResourceKind::Locking.allows_child(ResourceKind::Memory));
        assert!(!ResourceKind::CacheContainer.allows_child(ResourceKind::Locking));
    }
}
