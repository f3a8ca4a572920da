//! # Restart-Aware Lifecycle Controller
//!
//! Applies a configuration change with the minimum disruption its restart
//! classification allows: in place on the live configuration, by recreating
//! the owning service's subtree, or by recreating the whole container. A
//! recreate replays the full current model through the installer; if the
//! forward path fails after validation, the compensating recover path
//! restores the previous model value and reinstalls the last-known-good
//! configuration. No dependent is restarted until its parent's rebuild has
//! fully succeeded.

use crate::catalog::{keys, AttributeValue, RestartClassification};
use crate::error::{ManagementError, Result};
use crate::events::{names, EventPublisher};
use crate::lifecycle::installer::ServiceInstaller;
use crate::model::path::{ResourceKind, ResourcePath};
use crate::model::tree::ConfigurationTree;
use crate::services::{ServiceContainer, ServiceName};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct LifecycleController {
    services: Arc<ServiceContainer>,
    installer: ServiceInstaller,
    publisher: EventPublisher,
}

impl LifecycleController {
    pub fn new(
        services: Arc<ServiceContainer>,
        installer: ServiceInstaller,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            services,
            installer,
            publisher,
        }
    }

    /// Apply a validated attribute write. The model is updated first; the
    /// dispatch on the slot's classification decides what happens to the
    /// running services. On a failed recreate the previous value is restored
    /// before the error surfaces.
    pub async fn apply_write(
        &self,
        tree: &mut ConfigurationTree,
        path: &ResourcePath,
        attribute: &str,
        value: AttributeValue,
        classification: RestartClassification,
    ) -> Result<()> {
        let node = tree
            .node_mut(path)
            .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
        let kind = node.kind();
        let previous = node.set_attribute(attribute.to_string(), value.clone());

        match classification {
            RestartClassification::None => {
                self.apply_live(path, kind, attribute, &value);
                Ok(())
            }
            RestartClassification::ResourceServices => {
                let owner = path
                    .owning_service_path()
                    .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
                self.recreate_with_recovery(tree, &owner, path, attribute, previous)
                    .await
            }
            RestartClassification::AllServices => {
                let container = path
                    .container_path()
                    .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
                self.recreate_with_recovery(tree, &container, path, attribute, previous)
                    .await
            }
        }
    }

    /// Recreate the owner of `path` after a structural child add/remove.
    /// The caller has already mutated the tree; on failure the caller is
    /// responsible for restoring the model and calling again.
    pub async fn recreate_owner(&self, tree: &ConfigurationTree, owner: &ResourcePath) -> Result<()> {
        if !self.owner_installed(owner) {
            return Ok(());
        }
        self.recreate(tree, owner).await
    }

    /// Whether the service owning `owner` has ever been installed. Handles
    /// survive a stop, so this stays true across a recreate.
    pub fn owner_installed(&self, owner: &ResourcePath) -> bool {
        ServiceName::from_path(owner)
            .map(|name| self.services.handle(&name).is_some())
            .unwrap_or(false)
    }

    /// The in-place strategy: mutate the live configuration object held by
    /// the owning running service. Service identity and dependents stay
    /// untouched; the new value is visible to reads immediately.
    fn apply_live(&self, path: &ResourcePath, kind: ResourceKind, attribute: &str, value: &AttributeValue) {
        let Some(owner) = path.owning_service_path() else {
            return;
        };
        let Some(service_name) = ServiceName::from_path(&owner) else {
            return;
        };
        let Some(cache) = self.services.cache_runtime(&service_name) else {
            // No running service yet: the model carries the value and the
            // next install picks it up.
            return;
        };
        let Some(value) = value.as_long() else {
            return;
        };

        cache.configuration().update_runtime(|settings| match (kind, attribute) {
            (ResourceKind::Memory, keys::SIZE) => settings.memory_size = value,
            (ResourceKind::Expiration, keys::LIFESPAN) => settings.lifespan = value,
            (ResourceKind::Expiration, keys::MAX_IDLE) => settings.max_idle = value,
            (ResourceKind::Locking, keys::ACQUIRE_TIMEOUT) => settings.acquire_timeout = value,
            (ResourceKind::Transaction, keys::STOP_TIMEOUT) => settings.stop_timeout = value,
            _ => {}
        });
        debug!(service = %service_name, attribute, %value, "Applied attribute to live configuration");
    }

    /// Forward recreate plus the compensating recover path.
    async fn recreate_with_recovery(
        &self,
        tree: &mut ConfigurationTree,
        owner: &ResourcePath,
        path: &ResourcePath,
        attribute: &str,
        previous: Option<AttributeValue>,
    ) -> Result<()> {
        if !self.owner_installed(owner) {
            // Model-only change; services materialize on the next add.
            return Ok(());
        }

        let Err(error) = self.recreate(tree, owner).await else {
            return Ok(());
        };

        warn!(
            owner = %owner,
            attribute,
            error = %error,
            "Recreate failed, recovering last-known-good model"
        );

        // Restore the previous model value before replaying installation.
        if let Some(node) = tree.node_mut(path) {
            match previous {
                Some(previous) => {
                    node.set_attribute(attribute.to_string(), previous);
                }
                None => {
                    node.unset_attribute(attribute);
                }
            }
        }

        match self.recreate(tree, owner).await {
            Ok(()) => {
                self.publisher.publish(
                    names::OPERATION_RECOVERED,
                    json!({ "path": path.to_string(), "attribute": attribute }),
                );
                info!(owner = %owner, "Previous configuration reinstalled after failed recreate");
            }
            Err(recovery_error) => {
                // Even the last-known-good model failed to reinstall; the
                // services stay uninstalled rather than half-applied.
                warn!(
                    owner = %owner,
                    error = %recovery_error,
                    "Recovery reinstall failed, services left uninstalled"
                );
            }
        }
        Err(error)
    }

    /// Stop the owner and all transitive dependents, then replay the full
    /// add path from the refreshed model snapshot. Dependents restart only
    /// after the owner's new instance is confirmed running, which the
    /// installer's dependency ordering guarantees.
    async fn recreate(&self, tree: &ConfigurationTree, owner: &ResourcePath) -> Result<()> {
        let snapshot = tree.subtree_model(owner)?;
        let service_name = ServiceName::from_path(owner)
            .ok_or_else(|| ManagementError::ResourceNotFound(owner.to_string()))?;

        self.services.stop_subtree(&service_name).await?;

        if let Some(cache_name) = service_name.cache_name() {
            // Drop the stopped cache's runtime registration before the
            // rebuild replaces it.
            if let Some(container) = self
                .services
                .container_runtime(&service_name.owning_container())
            {
                container.unregister_cache(cache_name);
            }
        }

        self.installer.install(&snapshot).await?;
        debug!(owner = %service_name, "Subtree recreated from full model");
        Ok(())
    }
}
