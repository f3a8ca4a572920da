//! Translation round-trip: every non-defaulted model value must be readable
//! back from the built configuration object.

mod common;

use cachegrid_core::catalog::AttributeValue;
use cachegrid_core::engine::configuration::{
    CacheMode, EvictionType, IsolationLevel, StorageType, TransactionLocking, TransactionMode,
};
use cachegrid_core::engine::persistence::{JdbcDialect, StoreKind};
use cachegrid_core::management::ManagementCore;
use common::*;
use std::collections::BTreeMap;

async fn core_with_container() -> ManagementCore {
    let core = ManagementCore::new();
    add(&core, "cache-container=web", &[]).await;
    core
}

#[tokio::test]
async fn explicit_values_survive_translation_and_read_back() {
    let core = core_with_container().await;

    add(
        &core,
        "cache-container=web/replicated-cache=catalog",
        &[
            ("mode", AttributeValue::from("SYNC")),
            ("statistics", AttributeValue::Bool(false)),
            ("remote-timeout", AttributeValue::Long(25_000)),
        ],
    )
    .await;
    add(
        &core,
        "cache-container=web/replicated-cache=catalog/locking=locking",
        &[
            ("isolation", AttributeValue::from("REPEATABLE_READ")),
            ("striping", AttributeValue::Bool(true)),
            ("concurrency-level", AttributeValue::Long(512)),
            ("acquire-timeout", AttributeValue::Long(9_000)),
        ],
    )
    .await;
    add(
        &core,
        "cache-container=web/replicated-cache=catalog/transaction=transaction",
        &[
            ("mode", AttributeValue::from("NON_XA")),
            ("locking", AttributeValue::from("PESSIMISTIC")),
            ("notifications", AttributeValue::Bool(false)),
            ("stop-timeout", AttributeValue::Long(12_000)),
        ],
    )
    .await;
    add(
        &core,
        "cache-container=web/replicated-cache=catalog/expiration=expiration",
        &[
            ("lifespan", AttributeValue::Long(120_000)),
            ("max-idle", AttributeValue::Long(60_000)),
            ("interval", AttributeValue::Long(30_000)),
        ],
    )
    .await;
    add(
        &core,
        "cache-container=web/replicated-cache=catalog/memory=memory",
        &[
            ("storage", AttributeValue::from("OFF_HEAP")),
            ("size", AttributeValue::Long(5_000)),
            ("eviction", AttributeValue::from("MEMORY")),
            ("address-count", AttributeValue::Long(2_048)),
        ],
    )
    .await;
    add(
        &core,
        "cache-container=web/replicated-cache=catalog/authorization=authorization",
        &[(
            "roles",
            AttributeValue::List(vec!["admin".to_string(), "reader".to_string()]),
        )],
    )
    .await;
    let mut properties = BTreeMap::new();
    properties.insert("fetchSize".to_string(), "1000".to_string());
    add(
        &core,
        "cache-container=web/replicated-cache=catalog/jdbc-store=jdbc-store",
        &[
            ("datasource", AttributeValue::from("java:jboss/datasources/GridDS")),
            ("dialect", AttributeValue::from("POSTGRES")),
            ("table-prefix", AttributeValue::from("grid_entry")),
            ("shared", AttributeValue::Bool(true)),
            ("preload", AttributeValue::Bool(true)),
            ("properties", AttributeValue::Map(properties.clone())),
        ],
    )
    .await;

    let runtime = core
        .services()
        .cache_runtime(&cachegrid_core::services::ServiceName::cache("web", "catalog"))
        .expect("catalog cache running");
    let config = runtime.configuration();

    assert_eq!(config.mode(), CacheMode::ReplicatedSync);
    assert!(!config.statistics());
    assert_eq!(config.remote_timeout(), Some(25_000));

    assert_eq!(config.locking().isolation, IsolationLevel::RepeatableRead);
    assert!(config.locking().striping);
    assert_eq!(config.locking().concurrency_level, 512);
    assert_eq!(config.runtime().acquire_timeout, 9_000);

    assert_eq!(config.transaction().mode, TransactionMode::NonXa);
    assert_eq!(config.transaction().locking, TransactionLocking::Pessimistic);
    assert!(!config.transaction().notifications);
    assert_eq!(config.runtime().stop_timeout, 12_000);

    assert_eq!(config.runtime().lifespan, 120_000);
    assert_eq!(config.runtime().max_idle, 60_000);
    assert_eq!(config.expiration().interval, 30_000);
    assert!(config.expiration().reaper_enabled());

    assert_eq!(config.memory().storage, StorageType::OffHeap);
    assert_eq!(config.memory().eviction, EvictionType::Memory);
    assert_eq!(config.memory().address_count, Some(2_048));
    assert_eq!(config.runtime().memory_size, 5_000);

    let authorization = config.authorization().expect("authorization configured");
    assert!(authorization.enabled);
    assert_eq!(authorization.roles, vec!["admin", "reader"]);

    let store = &config.persistence().stores[0];
    assert!(store.shared);
    assert!(store.preload);
    assert_eq!(store.properties, properties);
    match &store.kind {
        StoreKind::Jdbc { datasource, dialect, table_prefix } => {
            assert_eq!(datasource, "java:jboss/datasources/GridDS");
            assert_eq!(*dialect, Some(JdbcDialect::Postgres));
            assert_eq!(table_prefix, "grid_entry");
        }
        other => panic!("expected a jdbc store, got {other:?}"),
    }
}

#[tokio::test]
async fn async_mode_drops_the_remote_timeout_branch() {
    let core = core_with_container().await;
    add(
        &core,
        "cache-container=web/replicated-cache=feed",
        &[
            ("mode", AttributeValue::from("ASYNC")),
            ("remote-timeout", AttributeValue::Long(25_000)),
        ],
    )
    .await;

    let runtime = core
        .services()
        .cache_runtime(&cachegrid_core::services::ServiceName::cache("web", "feed"))
        .unwrap();
    assert_eq!(runtime.configuration().mode(), CacheMode::ReplicatedAsync);
    // The slot stays in the model but never reaches the configuration.
    assert_eq!(runtime.configuration().remote_timeout(), None);
    let value = read(&core, "cache-container=web/replicated-cache=feed", "remote-timeout").await;
    assert_eq!(value, Some(AttributeValue::Long(25_000)));
}

#[tokio::test]
async fn defaults_resolve_for_unset_slots() {
    let core = core_with_container().await;
    add(&core, "cache-container=web/distributed-cache=sessions", &[]).await;

    // Catalog defaults surface through read-attribute.
    let value = read(&core, "cache-container=web/distributed-cache=sessions", "owners").await;
    assert_eq!(value, Some(AttributeValue::Long(2)));

    let runtime = core
        .services()
        .cache_runtime(&cachegrid_core::services::ServiceName::cache("web", "sessions"))
        .unwrap();
    let distribution = runtime.configuration().distribution().expect("distributed mode");
    assert_eq!(distribution.owners, 2);
    assert_eq!(distribution.segments, 256);
    assert_eq!(runtime.configuration().mode(), CacheMode::DistributedSync);
}
