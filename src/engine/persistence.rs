//! Persistence store configuration.

use crate::engine::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Providers the engine can resolve for custom stores. Anything else fails
/// at build time, the same way an unresolvable store implementation would.
pub const REGISTERED_PROVIDERS: &[&str] = &["soft-index", "async-delegate", "composite"];

pub fn provider_registered(provider: &str) -> bool {
    REGISTERED_PROVIDERS.contains(&provider)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JdbcDialect {
    H2,
    Postgres,
    Mysql,
    Oracle,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressionType {
    None,
    Snappy,
    Zlib,
    Lz4,
}

/// Per-kind store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StoreKind {
    File {
        path: String,
        relative_to: String,
        max_entries: i64,
    },
    Jdbc {
        datasource: String,
        dialect: Option<JdbcDialect>,
        table_prefix: String,
    },
    Remote {
        servers: Vec<String>,
        cache: Option<String>,
        socket_timeout: i64,
        tcp_no_delay: bool,
    },
    Rocksdb {
        path: String,
        block_size: i64,
        cache_size: i64,
        clear_threshold: i64,
        compression: CompressionType,
    },
    Custom {
        provider: String,
    },
}

/// One configured store plus the attributes every store kind shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfiguration {
    pub kind: StoreKind,
    pub shared: bool,
    pub preload: bool,
    pub purge: bool,
    pub fetch_state: bool,
    pub properties: BTreeMap<String, String>,
}

impl StoreConfiguration {
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            shared: false,
            preload: false,
            purge: true,
            fetch_state: true,
            properties: BTreeMap::new(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        match &self.kind {
            StoreKind::File { path, .. } | StoreKind::Rocksdb { path, .. } => {
                if path.is_empty() {
                    return Err(BuildError::Missing("store path".to_string()));
                }
            }
            StoreKind::Jdbc { datasource, .. } => {
                if datasource.is_empty() {
                    return Err(BuildError::Missing("jdbc datasource".to_string()));
                }
            }
            StoreKind::Remote { servers, .. } => {
                if servers.is_empty() {
                    return Err(BuildError::Missing("remote store servers".to_string()));
                }
            }
            StoreKind::Custom { provider } => {
                if !provider_registered(provider) {
                    return Err(BuildError::UnknownProvider(provider.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Persistence section of a cache configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistenceConfiguration {
    pub passivation: bool,
    pub stores: Vec<StoreConfiguration>,
}
