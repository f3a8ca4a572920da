//! Loading declarative bootstrap definitions and replaying them as
//! management operations.

mod common;

use cachegrid_core::catalog::AttributeValue;
use cachegrid_core::config::BootstrapDefinition;
use cachegrid_core::error::ManagementError;
use cachegrid_core::management::ManagementCore;
use cachegrid_core::services::{ServiceName, ServiceState};
use common::*;
use std::io::Write;

const DEFINITION: &str = r#"
containers:
  - name: web
    attributes:
      default-cache: sessions
    transport:
      stack: tcp
      cluster: web-cluster
    caches:
      - name: sessions
        kind: distributed-cache
        attributes:
          mode: SYNC
        memory:
          size: 1000
        stores:
          - kind: file-store
            attributes:
              max-entries: 5000
      - name: tokens
        kind: local-cache
"#;

#[tokio::test]
async fn definitions_materialize_into_running_services() {
    let core = ManagementCore::new();
    let definition = BootstrapDefinition::from_yaml_str(DEFINITION).unwrap();
    definition.apply(&core).await.unwrap();

    for service in [
        ServiceName::container("web"),
        ServiceName::cache("web", "sessions"),
        ServiceName::cache("web", "tokens"),
    ] {
        assert_eq!(core.services().state(&service), ServiceState::Running, "{service}");
    }

    let value = read(
        &core,
        "cache-container=web/distributed-cache=sessions/memory=memory",
        "size",
    )
    .await;
    assert_eq!(value, Some(AttributeValue::Long(1_000)));

    let container = core
        .services()
        .container_runtime(&ServiceName::container("web"))
        .unwrap();
    let transport = container.configuration().transport.clone().unwrap();
    assert_eq!(transport.stack, "tcp");
    assert_eq!(transport.cluster, "web-cluster");
}

#[tokio::test]
async fn definition_files_load_with_guards() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DEFINITION.as_bytes()).unwrap();
    file.flush().unwrap();

    let definition = BootstrapDefinition::load_file(file.path()).unwrap();
    assert_eq!(definition.containers.len(), 1);
    assert_eq!(definition.containers[0].caches.len(), 2);

    // A directory is not a definition file.
    let dir = tempfile::tempdir().unwrap();
    let error = BootstrapDefinition::load_file(dir.path()).unwrap_err();
    assert!(matches!(error, ManagementError::Configuration(_)));

    let error = BootstrapDefinition::load_file(dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(error, ManagementError::Configuration(_)));
}

#[tokio::test]
async fn invalid_definition_values_fail_validation_on_apply() {
    let definition = BootstrapDefinition::from_yaml_str(
        r#"
containers:
  - name: web
    caches:
      - name: sessions
        kind: distributed-cache
        memory:
          storage: QUANTUM
"#,
    )
    .unwrap();

    let core = ManagementCore::new();
    let error = definition.apply(&core).await.unwrap_err();
    assert!(matches!(error, ManagementError::InvalidAttributeValue { .. }));
}

#[tokio::test]
async fn unknown_cache_kind_is_rejected() {
    let definition = BootstrapDefinition::from_yaml_str(
        r#"
containers:
  - name: web
    caches:
      - name: sessions
        kind: quantum-cache
"#,
    )
    .unwrap();

    let core = ManagementCore::new();
    let error = definition.apply(&core).await.unwrap_err();
    assert!(matches!(error, ManagementError::Configuration(_)));
}
