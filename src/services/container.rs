//! The service container.
//!
//! Owns every installed service handle, the dependency graph, and the
//! ordered, awaited stop/start walks the lifecycle controller relies on.
//! Handles survive a stop so that cycle counters keep counting across a
//! recreate; they are dropped only on removal.

use crate::engine::runtime::{CacheContainerRuntime, CacheRuntime};
use crate::error::{ManagementError, Result};
use crate::events::{names, EventPublisher};
use crate::services::graph::DependencyGraph;
use crate::services::name::ServiceName;
use crate::services::state::{determine_target_state, ServiceEvent, ServiceState};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// The runtime object a service materializes.
#[derive(Debug, Clone)]
pub enum ServiceRuntime {
    Container(Arc<CacheContainerRuntime>),
    Cache(Arc<CacheRuntime>),
}

impl ServiceRuntime {
    fn start(&self) {
        match self {
            Self::Container(runtime) => runtime.start(),
            Self::Cache(runtime) => runtime.start(),
        }
    }

    fn stop(&self) {
        match self {
            Self::Container(runtime) => runtime.stop(),
            Self::Cache(runtime) => runtime.stop(),
        }
    }

    pub fn as_container(&self) -> Option<Arc<CacheContainerRuntime>> {
        match self {
            Self::Container(runtime) => Some(runtime.clone()),
            Self::Cache(_) => None,
        }
    }

    pub fn as_cache(&self) -> Option<Arc<CacheRuntime>> {
        match self {
            Self::Cache(runtime) => Some(runtime.clone()),
            Self::Container(_) => None,
        }
    }
}

/// One installed service: state, cycle counters, runtime object.
#[derive(Debug)]
pub struct ServiceHandle {
    name: ServiceName,
    state: RwLock<ServiceState>,
    start_cycles: AtomicU64,
    stop_cycles: AtomicU64,
    runtime: RwLock<Option<ServiceRuntime>>,
}

impl ServiceHandle {
    fn new(name: ServiceName) -> Self {
        Self {
            name,
            state: RwLock::new(ServiceState::Uninstalled),
            start_cycles: AtomicU64::new(0),
            stop_cycles: AtomicU64::new(0),
            runtime: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Number of completed starts since the handle was created.
    pub fn start_cycles(&self) -> u64 {
        self.start_cycles.load(Ordering::Relaxed)
    }

    /// Number of completed stops since the handle was created.
    pub fn stop_cycles(&self) -> u64 {
        self.stop_cycles.load(Ordering::Relaxed)
    }

    pub fn runtime(&self) -> Option<ServiceRuntime> {
        self.runtime.read().clone()
    }

    fn transition(&self, event: ServiceEvent) -> Result<ServiceState> {
        let mut state = self.state.write();
        let target = determine_target_state(&self.name.to_string(), *state, event)?;
        *state = target;
        Ok(target)
    }
}

/// Container of named service units with explicit dependency edges.
#[derive(Debug)]
pub struct ServiceContainer {
    services: DashMap<ServiceName, Arc<ServiceHandle>>,
    graph: RwLock<DependencyGraph>,
    publisher: EventPublisher,
}

impl ServiceContainer {
    pub fn new(publisher: EventPublisher) -> Self {
        Self {
            services: DashMap::new(),
            graph: RwLock::new(DependencyGraph::new()),
            publisher,
        }
    }

    pub fn handle(&self, name: &ServiceName) -> Option<Arc<ServiceHandle>> {
        self.services.get(name).map(|entry| entry.value().clone())
    }

    pub fn state(&self, name: &ServiceName) -> ServiceState {
        self.handle(name).map(|h| h.state()).unwrap_or_default()
    }

    pub fn container_runtime(&self, name: &ServiceName) -> Option<Arc<CacheContainerRuntime>> {
        self.handle(name)?.runtime()?.as_container()
    }

    pub fn cache_runtime(&self, name: &ServiceName) -> Option<Arc<CacheRuntime>> {
        self.handle(name)?.runtime()?.as_cache()
    }

    /// Install and start a service. Dependencies must already be running;
    /// the call returns only once the new service is confirmed running.
    pub async fn install(
        &self,
        name: ServiceName,
        runtime: ServiceRuntime,
        dependencies: &[ServiceName],
    ) -> Result<()> {
        for dependency in dependencies {
            if self.state(dependency) != ServiceState::Running {
                return Err(ManagementError::DependencyUnavailable {
                    service: name.to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }

        let handle = self
            .services
            .entry(name.clone())
            .or_insert_with(|| Arc::new(ServiceHandle::new(name.clone())))
            .value()
            .clone();

        handle.transition(ServiceEvent::Install)?;
        self.publish_state(&name, names::SERVICE_INSTALLING);

        let edges = {
            let mut graph = self.graph.write();
            if !graph.contains(&name) {
                graph.add_service(name.clone());
            }
            dependencies
                .iter()
                .try_for_each(|dependency| graph.add_dependency(&name, dependency))
        };
        if let Err(error) = edges {
            handle.transition(ServiceEvent::Fail)?;
            self.publish_state(&name, names::SERVICE_UNINSTALLED);
            return Err(error);
        }

        *handle.runtime.write() = Some(runtime.clone());

        // Service start completes asynchronously relative to the management
        // operation; the await point models that hand-off.
        tokio::task::yield_now().await;
        runtime.start();

        handle.transition(ServiceEvent::Started)?;
        handle.start_cycles.fetch_add(1, Ordering::Relaxed);
        self.publish_state(&name, names::SERVICE_RUNNING);
        info!(service = %name, "Service running");
        Ok(())
    }

    /// Stop one service. Callers are responsible for stopping dependents
    /// first; use [`ServiceContainer::stop_subtree`] for the ordered walk.
    pub async fn stop(&self, name: &ServiceName) -> Result<()> {
        let handle = self
            .handle(name)
            .ok_or_else(|| ManagementError::ResourceNotFound(name.to_string()))?;

        handle.transition(ServiceEvent::Stop)?;
        self.publish_state(name, names::SERVICE_STOPPING);

        let runtime = handle.runtime.write().take();
        tokio::task::yield_now().await;
        if let Some(runtime) = runtime {
            runtime.stop();
        }

        handle.transition(ServiceEvent::Stopped)?;
        handle.stop_cycles.fetch_add(1, Ordering::Relaxed);
        self.publish_state(name, names::SERVICE_UNINSTALLED);
        debug!(service = %name, "Service stopped");
        Ok(())
    }

    /// Stop a service and all transitive dependents, dependents first. All
    /// stops are awaited before this returns, so a recreation of the same
    /// subtree can never overlap a previous one.
    pub async fn stop_subtree(&self, name: &ServiceName) -> Result<()> {
        let order = self.graph.read().stop_order(name);
        for dependent in &order {
            if self.state(dependent) == ServiceState::Running {
                self.stop(dependent).await?;
            }
        }
        if self.state(name) == ServiceState::Running {
            self.stop(name).await?;
        }
        Ok(())
    }

    /// Stop and drop a service and its exclusively-owned dependents.
    pub async fn remove_subtree(&self, name: &ServiceName) -> Result<()> {
        let dependents = self.graph.read().stop_order(name);
        self.stop_subtree(name).await?;

        let mut graph = self.graph.write();
        for dependent in &dependents {
            graph.remove_service(dependent);
            self.services.remove(dependent);
        }
        graph.remove_service(name);
        self.services.remove(name);
        Ok(())
    }

    /// Dependents of `name` in start order (dependencies first).
    pub fn start_order(&self, name: &ServiceName) -> Vec<ServiceName> {
        self.graph.read().start_order(name)
    }

    pub fn service_names(&self) -> Vec<ServiceName> {
        self.services.iter().map(|entry| entry.key().clone()).collect()
    }

    fn publish_state(&self, name: &ServiceName, event: &str) {
        self.publisher
            .publish(event, json!({ "service": name.to_string() }));
    }
}
