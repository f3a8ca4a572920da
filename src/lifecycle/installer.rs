//! Service installation from a full model snapshot.
//!
//! One reusable path builds runtime objects out of a validated subtree and
//! installs them in dependency order. The add handlers and the restart
//! controller's recreate step both run through here, which is what makes a
//! recreate equivalent to a fresh add of the same model.

use crate::catalog::Catalog;
use crate::engine::runtime::{CacheContainerRuntime, CacheRuntime};
use crate::error::{ManagementError, Result};
use crate::model::node::ConfigurationNode;
use crate::services::{ServiceContainer, ServiceName, ServiceRuntime};
use crate::translator;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ServiceInstaller {
    catalog: Arc<Catalog>,
    services: Arc<ServiceContainer>,
}

impl ServiceInstaller {
    pub fn new(catalog: Arc<Catalog>, services: Arc<ServiceContainer>) -> Self {
        Self { catalog, services }
    }

    /// Install the container service and every cache defined in the model
    /// snapshot, container first, caches in dependency order after it.
    pub async fn install_container(&self, model: &ConfigurationNode) -> Result<()> {
        let container_name = model.name().to_string();
        let service_name = ServiceName::container(container_name.clone());

        let configuration = translator::container_configuration(&self.catalog, model);
        let runtime = Arc::new(CacheContainerRuntime::new(container_name.clone(), configuration));
        self.services
            .install(service_name.clone(), ServiceRuntime::Container(runtime), &[])
            .await?;
        debug!(container = %container_name, "Container service installed");

        // Caches only depend on the container, so they install concurrently.
        // join_all lets every install run to completion; a cancelled install
        // would strand a service in the installing state.
        let results = futures::future::join_all(
            model
                .cache_children()
                .map(|cache| self.install_cache(&container_name, cache)),
        )
        .await;
        for result in results {
            result?;
        }
        Ok(())
    }

    /// Install one cache service against its (running) container.
    pub async fn install_cache(&self, container_name: &str, model: &ConfigurationNode) -> Result<()> {
        let container_service = ServiceName::container(container_name);
        let service_name = ServiceName::cache(container_name, model.name());

        let container_runtime = self
            .services
            .container_runtime(&container_service)
            .ok_or_else(|| ManagementError::DependencyUnavailable {
                service: service_name.to_string(),
                dependency: container_service.to_string(),
            })?;

        let configuration = translator::cache_configuration(&self.catalog, container_name, model)
            .map_err(|e| ManagementError::installation(service_name.to_string(), e.to_string()))?;

        let cache_runtime = Arc::new(CacheRuntime::new(model.name(), configuration));
        self.services
            .install(
                service_name.clone(),
                ServiceRuntime::Cache(cache_runtime.clone()),
                &[container_service],
            )
            .await?;
        container_runtime.register_cache(cache_runtime);
        debug!(cache = %service_name, "Cache service installed");
        Ok(())
    }

    /// Install whatever the snapshot's kind calls for.
    pub async fn install(&self, model: &ConfigurationNode) -> Result<()> {
        if model.kind() == crate::model::path::ResourceKind::CacheContainer {
            self.install_container(model).await
        } else {
            let container = model
                .path()
                .container_path()
                .and_then(|p| p.name().map(str::to_string))
                .ok_or_else(|| {
                    ManagementError::Configuration(format!(
                        "Cache model '{}' is not inside a container",
                        model.path()
                    ))
                })?;
            self.install_cache(&container, model).await
        }
    }

    /// Stop and drop the services owned by a model subtree, unregistering
    /// cache runtimes from their container.
    pub async fn uninstall(&self, model: &ConfigurationNode) -> Result<()> {
        let path = model.path();
        let Some(service_path) = path.owning_service_path() else {
            return Ok(());
        };
        if &service_path != path {
            // Sub-resources own no service of their own.
            return Ok(());
        }
        let Some(service_name) = ServiceName::from_path(path) else {
            return Ok(());
        };

        if let Some(cache_name) = service_name.cache_name() {
            let container_service = service_name.owning_container();
            if let Some(container_runtime) = self.services.container_runtime(&container_service) {
                container_runtime.unregister_cache(cache_name);
            }
        }
        self.services.remove_subtree(&service_name).await
    }
}
