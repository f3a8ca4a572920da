//! # Attribute Catalog
//!
//! Static descriptors for every logical configuration key: value type,
//! default, validation rule, and restart classification. The catalog is an
//! immutable value built once by [`Catalog::new`]; descriptor tables for the
//! individual resource kinds are composed from named attribute-group
//! fragments rather than an inheritance chain, so the store kinds share one
//! `store-common` fragment and add their own keys on top.

pub mod types;
pub mod validation;

pub use types::{AttributeType, AttributeValue};
pub use validation::Validator;

use crate::error::{ManagementError, Result};
use crate::model::path::ResourceKind;
use std::collections::BTreeMap;

/// Attribute name constants shared by the catalog, the translator, and the
/// lifecycle controller.
pub mod keys {
    pub const DEFAULT_CACHE: &str = "default-cache";
    pub const STATISTICS: &str = "statistics";
    pub const START: &str = "start";
    pub const ALIASES: &str = "aliases";

    pub const STACK: &str = "stack";
    pub const CLUSTER: &str = "cluster";
    pub const LOCK_TIMEOUT: &str = "lock-timeout";
    pub const INITIAL_CLUSTER_SIZE: &str = "initial-cluster-size";

    pub const MODE: &str = "mode";
    pub const BATCHING: &str = "batching";
    pub const TEMPLATE: &str = "template";
    pub const REMOTE_TIMEOUT: &str = "remote-timeout";
    pub const OWNERS: &str = "owners";
    pub const SEGMENTS: &str = "segments";
    pub const CAPACITY_FACTOR: &str = "capacity-factor";
    pub const L1_LIFESPAN: &str = "l1-lifespan";

    pub const ISOLATION: &str = "isolation";
    pub const STRIPING: &str = "striping";
    pub const ACQUIRE_TIMEOUT: &str = "acquire-timeout";
    pub const CONCURRENCY_LEVEL: &str = "concurrency-level";

    pub const STOP_TIMEOUT: &str = "stop-timeout";
    pub const LOCKING: &str = "locking";
    pub const NOTIFICATIONS: &str = "notifications";

    pub const LIFESPAN: &str = "lifespan";
    pub const MAX_IDLE: &str = "max-idle";
    pub const INTERVAL: &str = "interval";

    pub const STORAGE: &str = "storage";
    pub const SIZE: &str = "size";
    pub const EVICTION: &str = "eviction";
    pub const ADDRESS_COUNT: &str = "address-count";

    pub const SHARED: &str = "shared";
    pub const PRELOAD: &str = "preload";
    pub const PASSIVATION: &str = "passivation";
    pub const PURGE: &str = "purge";
    pub const FETCH_STATE: &str = "fetch-state";
    pub const PROPERTIES: &str = "properties";

    pub const PATH: &str = "path";
    pub const RELATIVE_TO: &str = "relative-to";
    pub const MAX_ENTRIES: &str = "max-entries";

    pub const DATASOURCE: &str = "datasource";
    pub const DIALECT: &str = "dialect";
    pub const TABLE_PREFIX: &str = "table-prefix";

    pub const REMOTE_SERVERS: &str = "remote-servers";
    pub const CACHE: &str = "cache";
    pub const SOCKET_TIMEOUT: &str = "socket-timeout";
    pub const TCP_NO_DELAY: &str = "tcp-no-delay";

    pub const BLOCK_SIZE: &str = "block-size";
    pub const CACHE_SIZE: &str = "cache-size";
    pub const CLEAR_THRESHOLD: &str = "clear-threshold";
    pub const COMPRESSION: &str = "compression";

    pub const PROVIDER: &str = "provider";

    pub const ENABLED: &str = "enabled";
    pub const ROLES: &str = "roles";
}

/// Blast radius of a change to one attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestartClassification {
    /// Applied in place on the live configuration object; no service cycles.
    None,
    /// The owning node's service (and its dependents) must be recreated.
    ResourceServices,
    /// The whole cache container must be recreated.
    AllServices,
}

/// One logical configuration key with its rules.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    pub key: &'static str,
    pub attribute_type: AttributeType,
    pub validator: Validator,
    pub default: Option<AttributeValue>,
    pub required: bool,
    pub restart: RestartClassification,
}

impl AttributeDescriptor {
    fn new(
        key: &'static str,
        attribute_type: AttributeType,
        validator: Validator,
        restart: RestartClassification,
    ) -> Self {
        Self {
            key,
            attribute_type,
            validator,
            default: None,
            required: false,
            restart,
        }
    }

    fn with_default(mut self, default: AttributeValue) -> Self {
        self.default = Some(default);
        self
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A named fragment of descriptors, the unit of table composition.
#[derive(Debug, Clone)]
pub struct AttributeGroup {
    pub name: &'static str,
    pub descriptors: Vec<AttributeDescriptor>,
}

impl AttributeGroup {
    fn new(name: &'static str, descriptors: Vec<AttributeDescriptor>) -> Self {
        Self { name, descriptors }
    }
}

/// Merge fragments into one table; later fragments win on key collisions.
fn merge(groups: &[&AttributeGroup]) -> BTreeMap<&'static str, AttributeDescriptor> {
    let mut table = BTreeMap::new();
    for group in groups {
        for descriptor in &group.descriptors {
            table.insert(descriptor.key, descriptor.clone());
        }
    }
    table
}

/// Immutable mapping from resource kind to its attribute descriptor table.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: BTreeMap<ResourceKind, BTreeMap<&'static str, AttributeDescriptor>>,
}

impl Catalog {
    /// Build the full catalog. Pure function of nothing; callers share the
    /// result behind an `Arc`.
    pub fn new() -> Self {
        use AttributeType::*;
        use RestartClassification::{AllServices, ResourceServices};

        let unbounded = i64::MAX;

        let container = AttributeGroup::new(
            "container",
            vec![
                AttributeDescriptor::new(keys::DEFAULT_CACHE, String, Validator::NonEmptyString, ResourceServices),
                AttributeDescriptor::new(keys::STATISTICS, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(true)),
                AttributeDescriptor::new(keys::START, Enum, Validator::EnumValues(&["EAGER", "LAZY"]), ResourceServices)
                    .with_default(AttributeValue::from("LAZY")),
                AttributeDescriptor::new(keys::ALIASES, StringList, Validator::StringList, ResourceServices)
                    .with_default(AttributeValue::List(Vec::new())),
            ],
        );

        let transport = AttributeGroup::new(
            "transport",
            vec![
                AttributeDescriptor::new(keys::STACK, Enum, Validator::EnumValues(&["udp", "tcp"]), AllServices)
                    .with_default(AttributeValue::from("udp")),
                AttributeDescriptor::new(keys::CLUSTER, String, Validator::NonEmptyString, AllServices)
                    .with_default(AttributeValue::from("cachegrid")),
                AttributeDescriptor::new(
                    keys::LOCK_TIMEOUT,
                    Long,
                    Validator::LongRange { min: 0, max: unbounded },
                    AllServices,
                )
                .with_default(AttributeValue::Long(240_000)),
                AttributeDescriptor::new(
                    keys::INITIAL_CLUSTER_SIZE,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    AllServices,
                )
                .with_default(AttributeValue::Long(-1)),
            ],
        );

        let cache_common = AttributeGroup::new(
            "cache-common",
            vec![
                AttributeDescriptor::new(keys::STATISTICS, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(true)),
                AttributeDescriptor::new(keys::BATCHING, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(false)),
                AttributeDescriptor::new(keys::TEMPLATE, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(false)),
            ],
        );

        let cache_clustered = AttributeGroup::new(
            "cache-clustered",
            vec![
                AttributeDescriptor::new(keys::MODE, Enum, Validator::EnumValues(&["SYNC", "ASYNC"]), ResourceServices)
                    .with_default(AttributeValue::from("SYNC")),
                AttributeDescriptor::new(
                    keys::REMOTE_TIMEOUT,
                    Long,
                    Validator::LongRange { min: 0, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(17_500)),
            ],
        );

        let cache_distributed = AttributeGroup::new(
            "cache-distributed",
            vec![
                AttributeDescriptor::new(
                    keys::OWNERS,
                    Long,
                    Validator::LongRange { min: 1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(2)),
                AttributeDescriptor::new(
                    keys::SEGMENTS,
                    Long,
                    Validator::LongRange { min: 1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(256)),
                AttributeDescriptor::new(keys::CAPACITY_FACTOR, Double, Validator::Double, ResourceServices)
                    .with_default(AttributeValue::Double(1.0)),
                AttributeDescriptor::new(
                    keys::L1_LIFESPAN,
                    Long,
                    Validator::LongRange { min: 0, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(0)),
            ],
        );

        let locking = AttributeGroup::new(
            "locking",
            vec![
                AttributeDescriptor::new(
                    keys::ISOLATION,
                    Enum,
                    Validator::EnumValues(&[
                        "NONE",
                        "READ_UNCOMMITTED",
                        "READ_COMMITTED",
                        "REPEATABLE_READ",
                        "SERIALIZABLE",
                    ]),
                    ResourceServices,
                )
                .with_default(AttributeValue::from("READ_COMMITTED")),
                AttributeDescriptor::new(keys::STRIPING, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(false)),
                AttributeDescriptor::new(
                    keys::ACQUIRE_TIMEOUT,
                    Long,
                    Validator::LongRange { min: 0, max: unbounded },
                    RestartClassification::None,
                )
                .with_default(AttributeValue::Long(15_000)),
                AttributeDescriptor::new(
                    keys::CONCURRENCY_LEVEL,
                    Long,
                    Validator::LongRange { min: 1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(1_000)),
            ],
        );

        let transaction = AttributeGroup::new(
            "transaction",
            vec![
                AttributeDescriptor::new(
                    keys::MODE,
                    Enum,
                    Validator::EnumValues(&["NONE", "BATCH", "NON_XA", "NON_DURABLE_XA", "FULL_XA"]),
                    ResourceServices,
                )
                .with_default(AttributeValue::from("NONE")),
                AttributeDescriptor::new(
                    keys::STOP_TIMEOUT,
                    Long,
                    Validator::LongRange { min: 0, max: unbounded },
                    RestartClassification::None,
                )
                .with_default(AttributeValue::Long(30_000)),
                AttributeDescriptor::new(
                    keys::LOCKING,
                    Enum,
                    Validator::EnumValues(&["OPTIMISTIC", "PESSIMISTIC"]),
                    ResourceServices,
                )
                .with_default(AttributeValue::from("OPTIMISTIC")),
                AttributeDescriptor::new(keys::NOTIFICATIONS, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(true)),
            ],
        );

        let expiration = AttributeGroup::new(
            "expiration",
            vec![
                AttributeDescriptor::new(
                    keys::LIFESPAN,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    RestartClassification::None,
                )
                .with_default(AttributeValue::Long(-1)),
                AttributeDescriptor::new(
                    keys::MAX_IDLE,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    RestartClassification::None,
                )
                .with_default(AttributeValue::Long(-1)),
                AttributeDescriptor::new(
                    keys::INTERVAL,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(60_000)),
            ],
        );

        let memory = AttributeGroup::new(
            "memory",
            vec![
                AttributeDescriptor::new(
                    keys::STORAGE,
                    Enum,
                    Validator::EnumValues(&["OBJECT", "BINARY", "OFF_HEAP"]),
                    ResourceServices,
                )
                .with_default(AttributeValue::from("OBJECT")),
                AttributeDescriptor::new(
                    keys::SIZE,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    RestartClassification::None,
                )
                .with_default(AttributeValue::Long(-1)),
                AttributeDescriptor::new(
                    keys::EVICTION,
                    Enum,
                    Validator::EnumValues(&["COUNT", "MEMORY"]),
                    ResourceServices,
                )
                .with_default(AttributeValue::from("COUNT")),
                AttributeDescriptor::new(
                    keys::ADDRESS_COUNT,
                    Long,
                    Validator::LongRange { min: 1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(1_048_576)),
            ],
        );

        let store_common = AttributeGroup::new(
            "store-common",
            vec![
                AttributeDescriptor::new(keys::SHARED, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(false)),
                AttributeDescriptor::new(keys::PRELOAD, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(false)),
                AttributeDescriptor::new(keys::PASSIVATION, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(false)),
                AttributeDescriptor::new(keys::PURGE, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(true)),
                AttributeDescriptor::new(keys::FETCH_STATE, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(true)),
                AttributeDescriptor::new(keys::PROPERTIES, PropertyMap, Validator::PropertyMap, ResourceServices)
                    .with_default(AttributeValue::Map(Default::default())),
            ],
        );

        let file_store = AttributeGroup::new(
            "file-store",
            vec![
                AttributeDescriptor::new(keys::PATH, String, Validator::NonEmptyString, ResourceServices),
                AttributeDescriptor::new(keys::RELATIVE_TO, String, Validator::NonEmptyString, ResourceServices)
                    .with_default(AttributeValue::from("data")),
                AttributeDescriptor::new(
                    keys::MAX_ENTRIES,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(-1)),
            ],
        );

        let jdbc_store = AttributeGroup::new(
            "jdbc-store",
            vec![
                AttributeDescriptor::new(keys::DATASOURCE, String, Validator::NonEmptyString, ResourceServices)
                    .required(),
                AttributeDescriptor::new(
                    keys::DIALECT,
                    Enum,
                    Validator::EnumValues(&["H2", "POSTGRES", "MYSQL", "ORACLE", "SQLITE"]),
                    ResourceServices,
                ),
                AttributeDescriptor::new(keys::TABLE_PREFIX, String, Validator::NonEmptyString, ResourceServices)
                    .with_default(AttributeValue::from("cg_entry")),
            ],
        );

        let remote_store = AttributeGroup::new(
            "remote-store",
            vec![
                AttributeDescriptor::new(keys::REMOTE_SERVERS, StringList, Validator::StringList, ResourceServices)
                    .required(),
                AttributeDescriptor::new(keys::CACHE, String, Validator::NonEmptyString, ResourceServices),
                AttributeDescriptor::new(
                    keys::SOCKET_TIMEOUT,
                    Long,
                    Validator::LongRange { min: 0, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(60_000)),
                AttributeDescriptor::new(keys::TCP_NO_DELAY, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(true)),
            ],
        );

        let rocksdb_store = AttributeGroup::new(
            "rocksdb-store",
            vec![
                AttributeDescriptor::new(keys::PATH, String, Validator::NonEmptyString, ResourceServices),
                AttributeDescriptor::new(
                    keys::BLOCK_SIZE,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(-1)),
                AttributeDescriptor::new(
                    keys::CACHE_SIZE,
                    Long,
                    Validator::LongRange { min: -1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(-1)),
                AttributeDescriptor::new(
                    keys::CLEAR_THRESHOLD,
                    Long,
                    Validator::LongRange { min: 1, max: unbounded },
                    ResourceServices,
                )
                .with_default(AttributeValue::Long(10_000)),
                AttributeDescriptor::new(
                    keys::COMPRESSION,
                    Enum,
                    Validator::EnumValues(&["NONE", "SNAPPY", "ZLIB", "LZ4"]),
                    ResourceServices,
                )
                .with_default(AttributeValue::from("NONE")),
            ],
        );

        let custom_store = AttributeGroup::new(
            "custom-store",
            vec![AttributeDescriptor::new(keys::PROVIDER, String, Validator::NonEmptyString, ResourceServices)
                .required()],
        );

        let authorization = AttributeGroup::new(
            "authorization",
            vec![
                AttributeDescriptor::new(keys::ENABLED, Bool, Validator::Bool, ResourceServices)
                    .with_default(AttributeValue::Bool(true)),
                AttributeDescriptor::new(keys::ROLES, StringList, Validator::StringList, ResourceServices)
                    .with_default(AttributeValue::List(Vec::new())),
            ],
        );

        let mut tables = BTreeMap::new();
        tables.insert(ResourceKind::CacheContainer, merge(&[&container]));
        tables.insert(ResourceKind::Transport, merge(&[&transport]));
        tables.insert(ResourceKind::LocalCache, merge(&[&cache_common]));
        tables.insert(ResourceKind::ReplicatedCache, merge(&[&cache_common, &cache_clustered]));
        tables.insert(
            ResourceKind::DistributedCache,
            merge(&[&cache_common, &cache_clustered, &cache_distributed]),
        );
        tables.insert(ResourceKind::InvalidationCache, merge(&[&cache_common, &cache_clustered]));
        tables.insert(ResourceKind::Locking, merge(&[&locking]));
        tables.insert(ResourceKind::Transaction, merge(&[&transaction]));
        tables.insert(ResourceKind::Expiration, merge(&[&expiration]));
        tables.insert(ResourceKind::Memory, merge(&[&memory]));
        tables.insert(ResourceKind::FileStore, merge(&[&store_common, &file_store]));
        tables.insert(ResourceKind::JdbcStore, merge(&[&store_common, &jdbc_store]));
        tables.insert(ResourceKind::RemoteStore, merge(&[&store_common, &remote_store]));
        tables.insert(ResourceKind::RocksdbStore, merge(&[&store_common, &rocksdb_store]));
        tables.insert(ResourceKind::CustomStore, merge(&[&store_common, &custom_store]));
        tables.insert(ResourceKind::Authorization, merge(&[&authorization]));

        Self { tables }
    }

    pub fn descriptor(&self, kind: ResourceKind, key: &str) -> Option<&AttributeDescriptor> {
        self.tables.get(&kind).and_then(|table| table.get(key))
    }

    pub fn descriptors(&self, kind: ResourceKind) -> impl Iterator<Item = &AttributeDescriptor> {
        self.tables.get(&kind).into_iter().flat_map(|table| table.values())
    }

    /// Validate a full attribute map for an add operation: every key must be
    /// known, every value must pass its rule, and required slots must be
    /// present. Nothing is mutated on failure.
    pub fn validate_add(
        &self,
        kind: ResourceKind,
        resource: &str,
        attributes: &BTreeMap<String, AttributeValue>,
    ) -> Result<()> {
        for (key, value) in attributes {
            let descriptor = self.descriptor(kind, key).ok_or_else(|| {
                ManagementError::UnknownAttribute {
                    resource: resource.to_string(),
                    attribute: key.clone(),
                }
            })?;
            descriptor.validator.validate(key, value)?;
        }
        for descriptor in self.descriptors(kind) {
            if descriptor.required && !attributes.contains_key(descriptor.key) {
                return Err(ManagementError::invalid_value(
                    descriptor.key,
                    "required attribute is missing",
                ));
            }
        }
        Ok(())
    }

    /// Validate a single write: key must be known and the value must pass.
    pub fn validate_write(
        &self,
        kind: ResourceKind,
        resource: &str,
        key: &str,
        value: &AttributeValue,
    ) -> Result<&AttributeDescriptor> {
        let descriptor =
            self.descriptor(kind, key)
                .ok_or_else(|| ManagementError::UnknownAttribute {
                    resource: resource.to_string(),
                    attribute: key.to_string(),
                })?;
        descriptor.validator.validate(key, value)?;
        Ok(descriptor)
    }

    /// Resolve a slot to its explicit value or its catalog default.
    pub fn resolve(
        &self,
        kind: ResourceKind,
        attributes: &BTreeMap<String, AttributeValue>,
        key: &str,
    ) -> Option<AttributeValue> {
        if let Some(value) = attributes.get(key) {
            return Some(value.clone());
        }
        self.descriptor(kind, key).and_then(|d| d.default.clone())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
