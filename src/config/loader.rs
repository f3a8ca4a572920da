//! Bootstrap definition loading.
//!
//! File discovery and guards, YAML parsing into typed definitions, and the
//! replay of those definitions as management operations.

use crate::catalog::AttributeValue;
use crate::error::{ManagementError, Result};
use crate::management::{ManagementCore, Operation};
use crate::model::path::{PathSegment, ResourceKind, ResourcePath};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use tracing::{debug, info};

const MAX_DEFINITION_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Root of a bootstrap document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapDefinition {
    #[serde(default)]
    pub containers: Vec<ContainerDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerDefinition {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub transport: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub caches: Vec<CacheDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheDefinition {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub locking: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub transaction: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub expiration: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub memory: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub authorization: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub stores: Vec<StoreDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreDefinition {
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
}

impl BootstrapDefinition {
    /// Parse a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ManagementError::Configuration(format!("Malformed bootstrap definition: {e}")))
    }

    /// Read and parse a definition file, with the usual guards against
    /// oversized or non-regular files.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            ManagementError::Configuration(format!("Cannot read '{}': {e}", path.display()))
        })?;
        if metadata.len() > MAX_DEFINITION_FILE_SIZE {
            return Err(ManagementError::Configuration(format!(
                "Definition file '{}' exceeds the {}MB limit",
                path.display(),
                MAX_DEFINITION_FILE_SIZE / (1024 * 1024)
            )));
        }
        if !metadata.is_file() {
            return Err(ManagementError::Configuration(format!(
                "Definition path '{}' is not a regular file",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ManagementError::Configuration(format!("Cannot read '{}': {e}", path.display()))
        })?;
        debug!(file = %path.display(), "Loaded bootstrap definition");
        Self::from_yaml_str(&content)
    }

    /// Load from `CACHEGRID_CONFIG` or the conventional default location.
    pub fn load_default() -> Result<Self> {
        let path =
            env::var("CACHEGRID_CONFIG").unwrap_or_else(|_| "config/cachegrid.yaml".to_string());
        Self::load_file(path)
    }

    /// Replay the definition as add operations against the core. Containers
    /// first, then transport and caches, then cache sub-resources, so every
    /// parent exists before its children.
    pub async fn apply(&self, core: &ManagementCore) -> Result<()> {
        for container in &self.containers {
            let container_path = ResourcePath::container(container.name.clone());
            core.execute(Operation::add(
                container_path.clone(),
                convert_attributes(&container.attributes)?,
            ))
            .await?;

            if let Some(transport) = &container.transport {
                let path = container_path.child(PathSegment::singleton(ResourceKind::Transport));
                core.execute(Operation::add(path, convert_attributes(transport)?))
                    .await?;
            }

            for cache in &container.caches {
                self.apply_cache(core, &container_path, cache).await?;
            }
            info!(container = %container.name, caches = container.caches.len(), "Bootstrap definition applied");
        }
        Ok(())
    }

    async fn apply_cache(
        &self,
        core: &ManagementCore,
        container_path: &ResourcePath,
        cache: &CacheDefinition,
    ) -> Result<()> {
        let kind: ResourceKind = cache
            .kind
            .parse()
            .map_err(ManagementError::Configuration)?;
        if !kind.is_cache() {
            return Err(ManagementError::Configuration(format!(
                "'{}' is not a cache kind",
                cache.kind
            )));
        }
        let cache_path = container_path.child(PathSegment::new(kind, cache.name.clone()));
        core.execute(Operation::add(
            cache_path.clone(),
            convert_attributes(&cache.attributes)?,
        ))
        .await?;

        let singletons = [
            (ResourceKind::Locking, &cache.locking),
            (ResourceKind::Transaction, &cache.transaction),
            (ResourceKind::Expiration, &cache.expiration),
            (ResourceKind::Memory, &cache.memory),
            (ResourceKind::Authorization, &cache.authorization),
        ];
        for (kind, attributes) in singletons {
            if let Some(attributes) = attributes {
                let path = cache_path.child(PathSegment::singleton(kind));
                core.execute(Operation::add(path, convert_attributes(attributes)?))
                    .await?;
            }
        }

        for store in &cache.stores {
            let store_kind: ResourceKind = store
                .kind
                .parse()
                .map_err(ManagementError::Configuration)?;
            if !store_kind.is_store() {
                return Err(ManagementError::Configuration(format!(
                    "'{}' is not a store kind",
                    store.kind
                )));
            }
            let segment = match &store.name {
                Some(name) => PathSegment::new(store_kind, name.clone()),
                None => PathSegment::singleton(store_kind),
            };
            core.execute(Operation::add(
                cache_path.child(segment),
                convert_attributes(&store.attributes)?,
            ))
            .await?;
        }
        Ok(())
    }
}

fn convert_attributes(
    raw: &BTreeMap<String, serde_yaml::Value>,
) -> Result<BTreeMap<String, AttributeValue>> {
    let mut attributes = BTreeMap::new();
    for (key, value) in raw {
        let value = AttributeValue::from_yaml(value).ok_or_else(|| {
            ManagementError::Configuration(format!("Unsupported value for attribute '{key}'"))
        })?;
        attributes.insert(key.clone(), value);
    }
    Ok(attributes)
}
