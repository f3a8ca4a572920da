//! Shared fixtures for the integration suite.

use cachegrid_core::catalog::AttributeValue;
use cachegrid_core::management::{ManagementCore, Operation, OperationResponse};
use cachegrid_core::model::ResourcePath;
use cachegrid_core::services::ServiceName;
use std::collections::BTreeMap;

pub fn path(s: &str) -> ResourcePath {
    s.parse().expect("well-formed test path")
}

pub fn attrs(pairs: &[(&str, AttributeValue)]) -> BTreeMap<String, AttributeValue> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

pub async fn add(core: &ManagementCore, target: &str, pairs: &[(&str, AttributeValue)]) {
    core.execute(Operation::add(path(target), attrs(pairs)))
        .await
        .unwrap_or_else(|e| panic!("add {target} failed: {e}"));
}

pub async fn write(
    core: &ManagementCore,
    target: &str,
    attribute: &str,
    value: AttributeValue,
) -> cachegrid_core::error::Result<OperationResponse> {
    core.execute(Operation::write_attribute(path(target), attribute, value)).await
}

pub async fn read(core: &ManagementCore, target: &str, attribute: &str) -> Option<AttributeValue> {
    core.execute(Operation::read_attribute(path(target), attribute))
        .await
        .unwrap_or_else(|e| panic!("read {target}/{attribute} failed: {e}"))
        .into_value()
}

/// (start cycles, stop cycles) for a service, zero when never installed.
pub fn cycles(core: &ManagementCore, service: &ServiceName) -> (u64, u64) {
    core.services()
        .handle(service)
        .map(|h| (h.start_cycles(), h.stop_cycles()))
        .unwrap_or((0, 0))
}

/// Container `web` (transport, default cache `sessions`) holding a
/// distributed `sessions` cache with memory and file-store sub-resources,
/// plus a local `tokens` cache with a custom store.
pub async fn fixture_core() -> ManagementCore {
    let core = ManagementCore::new();

    add(&core, "cache-container=web", &[("default-cache", AttributeValue::from("sessions"))]).await;
    add(
        &core,
        "cache-container=web/transport=transport",
        &[("cluster", AttributeValue::from("web-cluster"))],
    )
    .await;

    add_sessions_cache(&core).await;

    add(&core, "cache-container=web/local-cache=tokens", &[]).await;
    add(
        &core,
        "cache-container=web/local-cache=tokens/custom-store=custom-store",
        &[
            ("provider", AttributeValue::from("soft-index")),
            ("preload", AttributeValue::Bool(true)),
        ],
    )
    .await;

    core
}

/// The `sessions` cache subtree on its own, reusable for idempotence checks.
pub async fn add_sessions_cache(core: &ManagementCore) {
    add(
        core,
        "cache-container=web/distributed-cache=sessions",
        &[("mode", AttributeValue::from("SYNC"))],
    )
    .await;
    add(
        core,
        "cache-container=web/distributed-cache=sessions/memory=memory",
        &[("size", AttributeValue::Long(1_000))],
    )
    .await;
    add(
        core,
        "cache-container=web/distributed-cache=sessions/file-store=file-store",
        &[("max-entries", AttributeValue::Long(5_000))],
    )
    .await;
}

pub fn container_service() -> ServiceName {
    ServiceName::container("web")
}

pub fn sessions_service() -> ServiceName {
    ServiceName::cache("web", "sessions")
}

pub fn tokens_service() -> ServiceName {
    ServiceName::cache("web", "tokens")
}
