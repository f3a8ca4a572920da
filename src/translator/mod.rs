//! # Model-to-Configuration Translation
//!
//! Pure functions from a validated configuration subtree to the engine's
//! configuration objects. No side effects; the add path and the lifecycle
//! controller's recreate step both call in here with a full model snapshot,
//! which is why a recreate re-reads the whole subtree instead of a diff.

use crate::catalog::{keys, AttributeValue, Catalog};
use crate::engine::configuration::{
    AuthorizationConfiguration, CacheConfiguration, CacheMode, ContainerConfiguration,
    DistributionConfiguration, EvictionType, ExpirationConfiguration, IsolationLevel,
    LockingConfiguration, MemoryConfiguration, RuntimeSettings, StartMode, StorageType,
    TransactionConfiguration, TransactionLocking, TransactionMode, TransportConfiguration,
};
use crate::engine::persistence::{CompressionType, JdbcDialect, StoreConfiguration, StoreKind};
use crate::engine::BuildError;
use crate::model::node::ConfigurationNode;
use crate::model::path::ResourceKind;

/// Derive the engine cache mode from the cache kind and the sync/async
/// modifier attribute.
pub fn derive_mode(kind: ResourceKind, synchronous: bool) -> CacheMode {
    match (kind, synchronous) {
        (ResourceKind::LocalCache, _) => CacheMode::Local,
        (ResourceKind::ReplicatedCache, true) => CacheMode::ReplicatedSync,
        (ResourceKind::ReplicatedCache, false) => CacheMode::ReplicatedAsync,
        (ResourceKind::DistributedCache, true) => CacheMode::DistributedSync,
        (ResourceKind::DistributedCache, false) => CacheMode::DistributedAsync,
        (ResourceKind::InvalidationCache, true) => CacheMode::InvalidationSync,
        (ResourceKind::InvalidationCache, false) => CacheMode::InvalidationAsync,
        // Non-cache kinds never reach mode derivation.
        (other, _) => unreachable!("mode derivation for non-cache kind {other}"),
    }
}

fn resolve(catalog: &Catalog, node: &ConfigurationNode, key: &str) -> Option<AttributeValue> {
    catalog.resolve(node.kind(), node.attributes(), key)
}

fn resolve_bool(catalog: &Catalog, node: &ConfigurationNode, key: &str, fallback: bool) -> bool {
    resolve(catalog, node, key).and_then(|v| v.as_bool()).unwrap_or(fallback)
}

fn resolve_long(catalog: &Catalog, node: &ConfigurationNode, key: &str, fallback: i64) -> i64 {
    resolve(catalog, node, key).and_then(|v| v.as_long()).unwrap_or(fallback)
}

fn resolve_double(catalog: &Catalog, node: &ConfigurationNode, key: &str, fallback: f64) -> f64 {
    resolve(catalog, node, key).and_then(|v| v.as_double()).unwrap_or(fallback)
}

fn resolve_string(catalog: &Catalog, node: &ConfigurationNode, key: &str) -> Option<String> {
    resolve(catalog, node, key).and_then(|v| v.as_str().map(str::to_string))
}

fn resolve_list(catalog: &Catalog, node: &ConfigurationNode, key: &str) -> Vec<String> {
    resolve(catalog, node, key)
        .and_then(|v| v.as_list().map(<[String]>::to_vec))
        .unwrap_or_default()
}

/// Translate a container node's own attributes and transport child into the
/// container-level configuration.
pub fn container_configuration(catalog: &Catalog, container: &ConfigurationNode) -> ContainerConfiguration {
    let transport = container
        .child_of_kind(ResourceKind::Transport)
        .map(|node| TransportConfiguration {
            stack: resolve_string(catalog, node, keys::STACK).unwrap_or_else(|| "udp".to_string()),
            cluster: resolve_string(catalog, node, keys::CLUSTER)
                .unwrap_or_else(|| "cachegrid".to_string()),
            lock_timeout: resolve_long(catalog, node, keys::LOCK_TIMEOUT, 240_000),
            initial_cluster_size: resolve_long(catalog, node, keys::INITIAL_CLUSTER_SIZE, -1),
        });

    let start = match resolve_string(catalog, container, keys::START).as_deref() {
        Some("EAGER") => StartMode::Eager,
        _ => StartMode::Lazy,
    };

    ContainerConfiguration {
        default_cache: resolve_string(catalog, container, keys::DEFAULT_CACHE),
        statistics: resolve_bool(catalog, container, keys::STATISTICS, true),
        start,
        aliases: resolve_list(catalog, container, keys::ALIASES),
        transport,
    }
}

/// Translate a cache node (with its optional sub-resources) into a built
/// cache configuration.
pub fn cache_configuration(
    catalog: &Catalog,
    container_name: &str,
    cache: &ConfigurationNode,
) -> Result<CacheConfiguration, BuildError> {
    let kind = cache.kind();
    let synchronous = !kind.is_clustered_cache()
        || resolve_string(catalog, cache, keys::MODE).as_deref() != Some("ASYNC");
    let mode = derive_mode(kind, synchronous);

    let mut builder = CacheConfiguration::builder(mode)
        .template(resolve_bool(catalog, cache, keys::TEMPLATE, false))
        .statistics(resolve_bool(catalog, cache, keys::STATISTICS, true));

    // Remote timeout only applies once the resolved mode is synchronous and
    // clustered; an async or local cache ignores the slot entirely.
    if mode.is_clustered() && mode.is_synchronous() {
        builder = builder.remote_timeout(resolve_long(catalog, cache, keys::REMOTE_TIMEOUT, 17_500));
    }

    if mode.is_distributed() {
        builder = builder.distribution(DistributionConfiguration {
            owners: resolve_long(catalog, cache, keys::OWNERS, 2),
            segments: resolve_long(catalog, cache, keys::SEGMENTS, 256),
            capacity_factor: resolve_double(catalog, cache, keys::CAPACITY_FACTOR, 1.0),
            l1_lifespan: resolve_long(catalog, cache, keys::L1_LIFESPAN, 0),
        });
    }

    let mut runtime = RuntimeSettings::default();

    if let Some(locking) = cache.child_of_kind(ResourceKind::Locking) {
        runtime.acquire_timeout = resolve_long(catalog, locking, keys::ACQUIRE_TIMEOUT, 15_000);
        builder = builder.locking(LockingConfiguration {
            isolation: parse_isolation(resolve_string(catalog, locking, keys::ISOLATION).as_deref()),
            striping: resolve_bool(catalog, locking, keys::STRIPING, false),
            concurrency_level: resolve_long(catalog, locking, keys::CONCURRENCY_LEVEL, 1_000),
        });
    }

    if let Some(transaction) = cache.child_of_kind(ResourceKind::Transaction) {
        runtime.stop_timeout = resolve_long(catalog, transaction, keys::STOP_TIMEOUT, 30_000);
        builder = builder.transaction(TransactionConfiguration {
            mode: parse_transaction_mode(resolve_string(catalog, transaction, keys::MODE).as_deref()),
            locking: parse_transaction_locking(
                resolve_string(catalog, transaction, keys::LOCKING).as_deref(),
            ),
            notifications: resolve_bool(catalog, transaction, keys::NOTIFICATIONS, true),
        });
    }
    // Invocation batching overrides whatever transaction mode was configured.
    builder = builder.batching(resolve_bool(catalog, cache, keys::BATCHING, false));

    if let Some(expiration) = cache.child_of_kind(ResourceKind::Expiration) {
        runtime.lifespan = resolve_long(catalog, expiration, keys::LIFESPAN, -1);
        runtime.max_idle = resolve_long(catalog, expiration, keys::MAX_IDLE, -1);
        builder = builder.expiration(ExpirationConfiguration {
            interval: resolve_long(catalog, expiration, keys::INTERVAL, 60_000),
        });
    }

    if let Some(memory) = cache.child_of_kind(ResourceKind::Memory) {
        runtime.memory_size = resolve_long(catalog, memory, keys::SIZE, -1);
        let storage = parse_storage(resolve_string(catalog, memory, keys::STORAGE).as_deref());
        builder = builder.memory(MemoryConfiguration {
            storage,
            eviction: parse_eviction(resolve_string(catalog, memory, keys::EVICTION).as_deref()),
            address_count: (storage == StorageType::OffHeap)
                .then(|| resolve_long(catalog, memory, keys::ADDRESS_COUNT, 1_048_576)),
        });
    }

    if let Some(authorization) = cache.child_of_kind(ResourceKind::Authorization) {
        builder = builder.authorization(AuthorizationConfiguration {
            enabled: resolve_bool(catalog, authorization, keys::ENABLED, true),
            roles: resolve_list(catalog, authorization, keys::ROLES),
        });
    }

    // Passivation is a single persistence-section flag; any store carrying
    // it turns it on for the whole section.
    let mut passivation = false;
    for store in cache.store_children() {
        let (configuration, store_passivation) = store_configuration(catalog, container_name, store)?;
        builder = builder.add_store(configuration);
        passivation |= store_passivation;
    }
    builder = builder.passivation(passivation);

    builder.runtime_settings(runtime).build()
}

/// Translate one store node. Returns the store plus the passivation flag
/// carried on the store resource; the caller folds the flags of every store
/// into the one persistence-section setting.
fn store_configuration(
    catalog: &Catalog,
    container_name: &str,
    store: &ConfigurationNode,
) -> Result<(StoreConfiguration, bool), BuildError> {
    let kind = match store.kind() {
        ResourceKind::FileStore => StoreKind::File {
            path: resolve_string(catalog, store, keys::PATH)
                .unwrap_or_else(|| format!("cachegrid/{container_name}")),
            relative_to: resolve_string(catalog, store, keys::RELATIVE_TO)
                .unwrap_or_else(|| "data".to_string()),
            max_entries: resolve_long(catalog, store, keys::MAX_ENTRIES, -1),
        },
        ResourceKind::JdbcStore => StoreKind::Jdbc {
            datasource: resolve_string(catalog, store, keys::DATASOURCE)
                .ok_or_else(|| BuildError::Missing("jdbc datasource".to_string()))?,
            dialect: resolve_string(catalog, store, keys::DIALECT)
                .as_deref()
                .and_then(parse_dialect),
            table_prefix: resolve_string(catalog, store, keys::TABLE_PREFIX)
                .unwrap_or_else(|| "cg_entry".to_string()),
        },
        ResourceKind::RemoteStore => StoreKind::Remote {
            servers: resolve_list(catalog, store, keys::REMOTE_SERVERS),
            cache: resolve_string(catalog, store, keys::CACHE),
            socket_timeout: resolve_long(catalog, store, keys::SOCKET_TIMEOUT, 60_000),
            tcp_no_delay: resolve_bool(catalog, store, keys::TCP_NO_DELAY, true),
        },
        ResourceKind::RocksdbStore => StoreKind::Rocksdb {
            path: resolve_string(catalog, store, keys::PATH)
                .unwrap_or_else(|| format!("cachegrid/{container_name}/data")),
            block_size: resolve_long(catalog, store, keys::BLOCK_SIZE, -1),
            cache_size: resolve_long(catalog, store, keys::CACHE_SIZE, -1),
            clear_threshold: resolve_long(catalog, store, keys::CLEAR_THRESHOLD, 10_000),
            compression: parse_compression(
                resolve_string(catalog, store, keys::COMPRESSION).as_deref(),
            ),
        },
        ResourceKind::CustomStore => StoreKind::Custom {
            provider: resolve_string(catalog, store, keys::PROVIDER)
                .ok_or_else(|| BuildError::Missing("custom store provider".to_string()))?,
        },
        other => unreachable!("store translation for non-store kind {other}"),
    };

    let mut configuration = StoreConfiguration::new(kind);
    configuration.shared = resolve_bool(catalog, store, keys::SHARED, false);
    configuration.preload = resolve_bool(catalog, store, keys::PRELOAD, false);
    configuration.purge = resolve_bool(catalog, store, keys::PURGE, true);
    configuration.fetch_state = resolve_bool(catalog, store, keys::FETCH_STATE, true);
    if let Some(AttributeValue::Map(properties)) = resolve(catalog, store, keys::PROPERTIES) {
        configuration.properties = properties;
    }

    let passivation = resolve_bool(catalog, store, keys::PASSIVATION, false);
    Ok((configuration, passivation))
}

fn parse_isolation(value: Option<&str>) -> IsolationLevel {
    match value {
        Some("NONE") => IsolationLevel::None,
        Some("READ_UNCOMMITTED") => IsolationLevel::ReadUncommitted,
        Some("REPEATABLE_READ") => IsolationLevel::RepeatableRead,
        Some("SERIALIZABLE") => IsolationLevel::Serializable,
        _ => IsolationLevel::ReadCommitted,
    }
}

fn parse_transaction_mode(value: Option<&str>) -> TransactionMode {
    match value {
        Some("BATCH") => TransactionMode::Batch,
        Some("NON_XA") => TransactionMode::NonXa,
        Some("NON_DURABLE_XA") => TransactionMode::NonDurableXa,
        Some("FULL_XA") => TransactionMode::FullXa,
        _ => TransactionMode::None,
    }
}

fn parse_transaction_locking(value: Option<&str>) -> TransactionLocking {
    match value {
        Some("PESSIMISTIC") => TransactionLocking::Pessimistic,
        _ => TransactionLocking::Optimistic,
    }
}

fn parse_storage(value: Option<&str>) -> StorageType {
    match value {
        Some("BINARY") => StorageType::Binary,
        Some("OFF_HEAP") => StorageType::OffHeap,
        _ => StorageType::Object,
    }
}

fn parse_eviction(value: Option<&str>) -> EvictionType {
    match value {
        Some("MEMORY") => EvictionType::Memory,
        _ => EvictionType::Count,
    }
}

fn parse_dialect(value: &str) -> Option<JdbcDialect> {
    match value {
        "H2" => Some(JdbcDialect::H2),
        "POSTGRES" => Some(JdbcDialect::Postgres),
        "MYSQL" => Some(JdbcDialect::Mysql),
        "ORACLE" => Some(JdbcDialect::Oracle),
        "SQLITE" => Some(JdbcDialect::Sqlite),
        _ => None,
    }
}

fn parse_compression(value: Option<&str>) -> CompressionType {
    match value {
        Some("SNAPPY") => CompressionType::Snappy,
        Some("ZLIB") => CompressionType::Zlib,
        Some("LZ4") => CompressionType::Lz4,
        _ => CompressionType::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::path::{PathSegment, ResourcePath};
    use std::collections::BTreeMap;

    fn cache_node(kind: ResourceKind, attributes: &[(&str, AttributeValue)]) -> ConfigurationNode {
        let path = ResourcePath::container("web").child(PathSegment::new(kind, "sessions"));
        let attributes = attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ConfigurationNode::new(path, attributes)
    }

    fn with_child(
        mut cache: ConfigurationNode,
        kind: ResourceKind,
        attributes: &[(&str, AttributeValue)],
    ) -> ConfigurationNode {
        let path = cache.path().child(PathSegment::singleton(kind));
        let attributes: BTreeMap<String, AttributeValue> = attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        cache.insert_child(ConfigurationNode::new(path, attributes));
        cache
    }

    #[test]
    fn mode_derivation_combines_kind_and_modifier() {
        assert_eq!(derive_mode(ResourceKind::LocalCache, true), CacheMode::Local);
        assert_eq!(
            derive_mode(ResourceKind::ReplicatedCache, false),
            CacheMode::ReplicatedAsync
        );
        assert_eq!(
            derive_mode(ResourceKind::DistributedCache, true),
            CacheMode::DistributedSync
        );
    }

    #[test]
    fn remote_timeout_is_conditional_on_sync_mode() {
        let catalog = Catalog::new();

        let sync_cache = cache_node(ResourceKind::ReplicatedCache, &[]);
        let config = cache_configuration(&catalog, "web", &sync_cache).unwrap();
        assert_eq!(config.remote_timeout(), Some(17_500));

        let async_cache =
            cache_node(ResourceKind::ReplicatedCache, &[("mode", AttributeValue::from("ASYNC"))]);
        let config = cache_configuration(&catalog, "web", &async_cache).unwrap();
        assert_eq!(config.remote_timeout(), None);

        let local_cache = cache_node(ResourceKind::LocalCache, &[]);
        let config = cache_configuration(&catalog, "web", &local_cache).unwrap();
        assert_eq!(config.remote_timeout(), None);
    }

    #[test]
    fn optional_sub_resources_default_independently() {
        let catalog = Catalog::new();
        let cache = cache_node(ResourceKind::LocalCache, &[]);
        let config = cache_configuration(&catalog, "web", &cache).unwrap();

        // No sub-resources defined: every section carries its defaults.
        assert_eq!(config.locking().concurrency_level, 1_000);
        assert_eq!(config.runtime().memory_size, -1);
        assert!(config.persistence().stores.is_empty());
        assert!(config.authorization().is_none());
    }

    #[test]
    fn memory_sub_resource_feeds_runtime_settings() {
        let catalog = Catalog::new();
        let cache = with_child(
            cache_node(ResourceKind::LocalCache, &[]),
            ResourceKind::Memory,
            &[("size", AttributeValue::Long(1_000))],
        );
        let config = cache_configuration(&catalog, "web", &cache).unwrap();
        assert_eq!(config.runtime().memory_size, 1_000);
        assert_eq!(config.memory().storage, StorageType::Object);
        assert_eq!(config.memory().address_count, None);
    }

    #[test]
    fn file_store_path_defaults_to_the_container() {
        let catalog = Catalog::new();
        let cache = with_child(
            cache_node(ResourceKind::LocalCache, &[]),
            ResourceKind::FileStore,
            &[],
        );
        let config = cache_configuration(&catalog, "web", &cache).unwrap();
        let store = &config.persistence().stores[0];
        match &store.kind {
            StoreKind::File { path, relative_to, max_entries } => {
                assert_eq!(path, "cachegrid/web");
                assert_eq!(relative_to, "data");
                assert_eq!(*max_entries, -1);
            }
            other => panic!("expected a file store, got {other:?}"),
        }
    }

    #[test]
    fn authorization_roles_are_translated_as_a_list() {
        let catalog = Catalog::new();
        let cache = with_child(
            cache_node(ResourceKind::LocalCache, &[]),
            ResourceKind::Authorization,
            &[(
                "roles",
                AttributeValue::List(vec!["admin".to_string(), "reader".to_string()]),
            )],
        );
        let config = cache_configuration(&catalog, "web", &cache).unwrap();
        let authorization = config.authorization().unwrap();
        assert!(authorization.enabled);
        assert_eq!(authorization.roles, vec!["admin", "reader"]);
    }

    #[test]
    fn passivation_survives_a_trailing_non_passivating_store() {
        let catalog = Catalog::new();
        let mut cache = cache_node(ResourceKind::LocalCache, &[]);

        let hot = cache.path().child(PathSegment::new(ResourceKind::FileStore, "hot"));
        let mut attributes = BTreeMap::new();
        attributes.insert("passivation".to_string(), AttributeValue::Bool(true));
        cache.insert_child(ConfigurationNode::new(hot, attributes));

        let cold = cache.path().child(PathSegment::new(ResourceKind::FileStore, "cold"));
        cache.insert_child(ConfigurationNode::new(cold, BTreeMap::new()));

        let config = cache_configuration(&catalog, "web", &cache).unwrap();
        assert_eq!(config.persistence().stores.len(), 2);
        assert!(config.persistence().passivation);
    }

    #[test]
    fn passivating_store_conflicts_with_a_shared_sibling() {
        let catalog = Catalog::new();
        let mut cache = cache_node(ResourceKind::LocalCache, &[]);

        let hot = cache.path().child(PathSegment::new(ResourceKind::FileStore, "hot"));
        let mut attributes = BTreeMap::new();
        attributes.insert("passivation".to_string(), AttributeValue::Bool(true));
        cache.insert_child(ConfigurationNode::new(hot, attributes));

        let shared = cache.path().child(PathSegment::new(ResourceKind::FileStore, "shared"));
        let mut attributes = BTreeMap::new();
        attributes.insert("shared".to_string(), AttributeValue::Bool(true));
        cache.insert_child(ConfigurationNode::new(shared, attributes));

        let err = cache_configuration(&catalog, "web", &cache).unwrap_err();
        assert!(matches!(err, BuildError::Incompatible(_)));
    }

    #[test]
    fn unknown_custom_provider_fails_the_build() {
        let catalog = Catalog::new();
        let cache = with_child(
            cache_node(ResourceKind::LocalCache, &[]),
            ResourceKind::CustomStore,
            &[("provider", AttributeValue::from("black-hole"))],
        );
        let err = cache_configuration(&catalog, "web", &cache).unwrap_err();
        assert!(matches!(err, BuildError::UnknownProvider(_)));
    }
}
