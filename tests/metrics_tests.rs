//! Metric reads through the management surface: live values, the
//! unavailable sentinel, and unknown-metric rejection.

mod common;

use cachegrid_core::catalog::AttributeValue;
use cachegrid_core::error::ManagementError;
use cachegrid_core::management::Operation;
use cachegrid_core::metrics::MetricValue;
use common::*;

#[tokio::test]
async fn cache_metrics_read_live_statistics() {
    let core = fixture_core().await;

    let runtime = core.services().cache_runtime(&sessions_service()).unwrap();
    runtime.statistics().record_hit(2);
    runtime.statistics().record_hit(2);
    runtime.statistics().record_miss(2);
    runtime.statistics().record_eviction();

    let hits = core
        .execute(Operation::read_metric(
            path("cache-container=web/distributed-cache=sessions"),
            "hits",
        ))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert_eq!(hits, MetricValue::Long(2));

    let ratio = core
        .execute(Operation::read_metric(
            path("cache-container=web/distributed-cache=sessions"),
            "hit-ratio",
        ))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert!((ratio.as_double().unwrap() - 2.0 / 3.0).abs() < 1e-9);

    let evictions = core
        .execute(Operation::read_metric(
            path("cache-container=web/distributed-cache=sessions"),
            "evictions",
        ))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert_eq!(evictions, MetricValue::Long(1));
}

#[tokio::test]
async fn container_metrics_cover_membership_and_health() {
    let core = fixture_core().await;

    let members = core
        .execute(Operation::read_metric(path("cache-container=web"), "members"))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert_eq!(members, MetricValue::List(vec!["web-cluster-web-1".to_string()]));

    let health = core
        .execute(Operation::read_metric(path("cache-container=web"), "health"))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert_eq!(health, MetricValue::Text("HEALTHY".to_string()));

    let defined = core
        .execute(Operation::read_metric(path("cache-container=web"), "defined-cache-count"))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert_eq!(defined, MetricValue::Long(2));
}

#[tokio::test]
async fn stopped_service_reports_unavailable_not_an_error() {
    let core = fixture_core().await;

    // Drive the service down without touching the model, as a lazily
    // started deployment would look before first use.
    core.services().stop(&tokens_service()).await.unwrap();

    let value = core
        .execute(Operation::read_metric(
            path("cache-container=web/local-cache=tokens"),
            "hits",
        ))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert!(value.is_unavailable());
}

#[tokio::test]
async fn unknown_metric_and_missing_resource_are_rejected() {
    let core = fixture_core().await;

    let error = core
        .execute(Operation::read_metric(
            path("cache-container=web/local-cache=tokens"),
            "no-such-metric",
        ))
        .await
        .unwrap_err();
    assert!(matches!(error, ManagementError::UnknownAttribute { .. }));

    // Container metrics do not resolve against caches.
    let error = core
        .execute(Operation::read_metric(
            path("cache-container=web/local-cache=tokens"),
            "members",
        ))
        .await
        .unwrap_err();
    assert!(matches!(error, ManagementError::UnknownAttribute { .. }));

    let error = core
        .execute(Operation::read_metric(path("cache-container=missing"), "health"))
        .await
        .unwrap_err();
    assert!(matches!(error, ManagementError::ResourceNotFound(_)));
}

#[tokio::test]
async fn time_since_start_counts_from_service_start() {
    let core = fixture_core().await;
    let _ = core
        .execute(Operation::write_attribute(
            path("cache-container=web/distributed-cache=sessions/memory=memory"),
            "size",
            AttributeValue::Long(4_000),
        ))
        .await
        .unwrap();

    let value = core
        .execute(Operation::read_metric(
            path("cache-container=web/distributed-cache=sessions"),
            "time-since-start",
        ))
        .await
        .unwrap()
        .into_metric()
        .unwrap();
    assert!(value.as_long().unwrap() >= 0);
}
