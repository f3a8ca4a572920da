//! # Management Core
//!
//! Single entry point owning the catalog, the stored model, the service
//! container, and the lifecycle controller. Operations execute one at a
//! time, to completion, the way the host's operation pipeline serializes
//! them; validation always happens before any model mutation.

use crate::catalog::{AttributeValue, Catalog};
use crate::error::{ManagementError, Result};
use crate::events::{names, EventPublisher};
use crate::lifecycle::{LifecycleController, ServiceInstaller};
use crate::management::operations::{Operation, OperationKind, OperationResponse};
use crate::metrics::{MetricRegistry, MetricTarget, MetricValue};
use crate::model::path::ResourcePath;
use crate::model::tree::ConfigurationTree;
use crate::services::{ServiceContainer, ServiceName, ServiceRuntime};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct ManagementCore {
    catalog: Arc<Catalog>,
    services: Arc<ServiceContainer>,
    installer: ServiceInstaller,
    controller: LifecycleController,
    metrics: MetricRegistry,
    publisher: EventPublisher,
    tree: Mutex<ConfigurationTree>,
}

impl ManagementCore {
    pub fn new() -> Self {
        Self::with_publisher(EventPublisher::default())
    }

    pub fn with_publisher(publisher: EventPublisher) -> Self {
        let catalog = Arc::new(Catalog::new());
        let services = Arc::new(ServiceContainer::new(publisher.clone()));
        let installer = ServiceInstaller::new(catalog.clone(), services.clone());
        let controller =
            LifecycleController::new(services.clone(), installer.clone(), publisher.clone());
        Self {
            catalog,
            services,
            installer,
            controller,
            metrics: MetricRegistry::new(),
            publisher,
            tree: Mutex::new(ConfigurationTree::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Execute one operation to completion.
    pub async fn execute(&self, operation: Operation) -> Result<OperationResponse> {
        debug!(id = %operation.id, kind = %operation.kind, path = %operation.path, "Executing operation");
        let result = self.dispatch(&operation).await;
        match &result {
            Ok(_) => self.publisher.publish(
                names::OPERATION_COMPLETED,
                json!({
                    "id": operation.id,
                    "kind": operation.kind.to_string(),
                    "path": operation.path.to_string(),
                }),
            ),
            Err(error) => self.publisher.publish(
                names::OPERATION_FAILED,
                json!({
                    "id": operation.id,
                    "kind": operation.kind.to_string(),
                    "path": operation.path.to_string(),
                    "failure": error.to_string(),
                }),
            ),
        }
        result
    }

    async fn dispatch(&self, operation: &Operation) -> Result<OperationResponse> {
        match operation.kind {
            OperationKind::Add => {
                self.add(&operation.path, operation.attributes.clone()).await?;
                Ok(OperationResponse::Done)
            }
            OperationKind::Remove => {
                self.remove(&operation.path).await?;
                Ok(OperationResponse::Done)
            }
            OperationKind::WriteAttribute => {
                let attribute = operation
                    .attribute
                    .as_deref()
                    .ok_or_else(|| ManagementError::Configuration("write-attribute without an attribute name".to_string()))?;
                let value = operation
                    .value
                    .clone()
                    .ok_or_else(|| ManagementError::Configuration("write-attribute without a value".to_string()))?;
                self.write_attribute(&operation.path, attribute, value).await?;
                Ok(OperationResponse::Done)
            }
            OperationKind::ReadAttribute => {
                let attribute = operation
                    .attribute
                    .as_deref()
                    .ok_or_else(|| ManagementError::Configuration("read-attribute without an attribute name".to_string()))?;
                Ok(OperationResponse::Value(
                    self.read_attribute(&operation.path, attribute).await?,
                ))
            }
            OperationKind::ReadMetric => {
                let metric = operation
                    .attribute
                    .as_deref()
                    .ok_or_else(|| ManagementError::Configuration("read-metric without a metric name".to_string()))?;
                Ok(OperationResponse::Metric(
                    self.read_metric(&operation.path, metric).await?,
                ))
            }
        }
    }

    /// Validate and store a new node, then install its services when the
    /// node (or its owner) is runtime-bearing. A failed installation rolls
    /// the model back before surfacing.
    pub async fn add(
        &self,
        path: &ResourcePath,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Result<()> {
        let kind = path
            .kind()
            .ok_or_else(|| ManagementError::Configuration("Cannot add the root".to_string()))?;
        self.catalog.validate_add(kind, &path.to_string(), &attributes)?;

        let mut tree = self.tree.lock().await;
        tree.insert(path, attributes)?;

        if kind.owns_service() {
            let snapshot = tree.subtree_model(path)?;
            if let Err(error) = self.installer.install(&snapshot).await {
                // Nothing half-applied: drop the node and any partially
                // installed services of this subtree.
                let _ = tree.remove(path);
                if let Some(service) = ServiceName::from_path(path) {
                    let _ = self.services.remove_subtree(&service).await;
                }
                return Err(error);
            }
            info!(path = %path, "Resource added and services installed");
        } else {
            // Structural sub-resource: the owning service must pick it up.
            let owner = path
                .owning_service_path()
                .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
            if self.controller.owner_installed(&owner) {
                if let Err(error) = self.controller.recreate_owner(&tree, &owner).await {
                    let _ = tree.remove(path);
                    let _ = self.controller.recreate_owner(&tree, &owner).await;
                    return Err(error);
                }
            }
            info!(path = %path, "Resource added");
        }
        Ok(())
    }

    /// Uninstall the subtree's services, then delete the nodes.
    pub async fn remove(&self, path: &ResourcePath) -> Result<()> {
        let mut tree = self.tree.lock().await;
        let snapshot = tree.subtree_model(path)?;
        let kind = snapshot.kind();

        if kind.owns_service() {
            self.installer.uninstall(&snapshot).await?;
            tree.remove(path)?;
            info!(path = %path, "Resource removed and services uninstalled");
        } else {
            let owner = path
                .owning_service_path()
                .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
            tree.remove(path)?;
            if self.controller.owner_installed(&owner) {
                self.controller.recreate_owner(&tree, &owner).await?;
            }
            info!(path = %path, "Resource removed");
        }
        Ok(())
    }

    /// Validate one attribute write, then hand it to the lifecycle
    /// controller's classification dispatch.
    pub async fn write_attribute(
        &self,
        path: &ResourcePath,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<()> {
        let mut tree = self.tree.lock().await;
        let node = tree
            .node(path)
            .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
        let descriptor =
            self.catalog
                .validate_write(node.kind(), &path.to_string(), attribute, &value)?;
        let classification = descriptor.restart;

        self.controller
            .apply_write(&mut tree, path, attribute, value, classification)
            .await
    }

    /// Resolved value of a slot: explicit, else default, else `None`.
    pub async fn read_attribute(
        &self,
        path: &ResourcePath,
        attribute: &str,
    ) -> Result<Option<AttributeValue>> {
        let tree = self.tree.lock().await;
        let node = tree
            .node(path)
            .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
        let kind = node.kind();
        if self.catalog.descriptor(kind, attribute).is_none() {
            return Err(ManagementError::UnknownAttribute {
                resource: path.to_string(),
                attribute: attribute.to_string(),
            });
        }
        Ok(self.catalog.resolve(kind, node.attributes(), attribute))
    }

    /// Read a runtime metric through the registry. A service that is not
    /// running answers with the unavailable sentinel instead of an error.
    pub async fn read_metric(&self, path: &ResourcePath, metric: &str) -> Result<MetricValue> {
        let tree = self.tree.lock().await;
        if !tree.contains(path) {
            return Err(ManagementError::ResourceNotFound(path.to_string()));
        }
        let owner = path
            .owning_service_path()
            .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
        let service = ServiceName::from_path(&owner)
            .ok_or_else(|| ManagementError::ResourceNotFound(owner.to_string()))?;

        let known = if service.is_container() {
            self.metrics.has_container_metric(metric)
        } else {
            self.metrics.has_cache_metric(metric)
        };
        if !known {
            return Err(ManagementError::UnknownAttribute {
                resource: path.to_string(),
                attribute: metric.to_string(),
            });
        }

        let runtime = self.services.handle(&service).and_then(|h| h.runtime());
        let value = match runtime {
            Some(ServiceRuntime::Cache(cache)) => self
                .metrics
                .read(metric, &MetricTarget::Cache(&cache))
                .unwrap_or(MetricValue::Unavailable),
            Some(ServiceRuntime::Container(container)) => self
                .metrics
                .read(metric, &MetricTarget::Container(&container))
                .unwrap_or(MetricValue::Unavailable),
            None => MetricValue::Unavailable,
        };
        Ok(value)
    }
}

impl Default for ManagementCore {
    fn default() -> Self {
        Self::new()
    }
}
