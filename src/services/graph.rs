//! Service dependency graph.
//!
//! A DAG keyed by service name with adjacency lists. Stop order is reverse
//! topological (dependents first); start order is forward topological
//! (dependencies first). This realizes the ordering guarantee that no
//! dependent starts against a discarded parent instance.

use crate::error::{ManagementError, Result};
use crate::services::name::ServiceName;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// service -> services it depends on
    dependencies: BTreeMap<ServiceName, BTreeSet<ServiceName>>,
    /// service -> services depending on it
    dependents: BTreeMap<ServiceName, BTreeSet<ServiceName>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_service(&mut self, name: ServiceName) {
        self.dependencies.entry(name.clone()).or_default();
        self.dependents.entry(name).or_default();
    }

    pub fn contains(&self, name: &ServiceName) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Record that `dependent` requires `dependency`. Both must already be
    /// registered; an edge that would close a cycle is rejected.
    pub fn add_dependency(&mut self, dependent: &ServiceName, dependency: &ServiceName) -> Result<()> {
        if !self.contains(dependent) || !self.contains(dependency) {
            let missing = if self.contains(dependent) { dependency } else { dependent };
            return Err(ManagementError::DependencyUnavailable {
                service: dependent.to_string(),
                dependency: missing.to_string(),
            });
        }
        if dependent == dependency || self.depends_on(dependency, dependent) {
            return Err(ManagementError::Configuration(format!(
                "Dependency cycle between '{dependent}' and '{dependency}'"
            )));
        }
        self.dependencies
            .get_mut(dependent)
            .expect("registered above")
            .insert(dependency.clone());
        self.dependents
            .get_mut(dependency)
            .expect("registered above")
            .insert(dependent.clone());
        Ok(())
    }

    pub fn remove_service(&mut self, name: &ServiceName) {
        if let Some(deps) = self.dependencies.remove(name) {
            for dep in deps {
                if let Some(set) = self.dependents.get_mut(&dep) {
                    set.remove(name);
                }
            }
        }
        if let Some(dependents) = self.dependents.remove(name) {
            for dependent in dependents {
                if let Some(set) = self.dependencies.get_mut(&dependent) {
                    set.remove(name);
                }
            }
        }
    }

    pub fn dependencies_of(&self, name: &ServiceName) -> Vec<ServiceName> {
        self.dependencies
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Transitive reachability along dependency edges.
    fn depends_on(&self, service: &ServiceName, candidate: &ServiceName) -> bool {
        let mut stack = vec![service.clone()];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if &current == candidate {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(deps) = self.dependencies.get(&current) {
                stack.extend(deps.iter().cloned());
            }
        }
        false
    }

    /// All transitive dependents of `name`, ordered so that every service
    /// appears before anything it depends on: the stop order. `name` itself
    /// is not included.
    pub fn stop_order(&self, name: &ServiceName) -> Vec<ServiceName> {
        let mut order = self.start_order(name);
        order.reverse();
        order
    }

    /// All transitive dependents of `name`, ordered so that every service
    /// appears after everything it depends on: the restart order. `name`
    /// itself is not included.
    pub fn start_order(&self, name: &ServiceName) -> Vec<ServiceName> {
        // Collect the dependent closure, then order it by dependency depth.
        let mut closure = BTreeSet::new();
        let mut stack: Vec<ServiceName> = self
            .dependents
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if closure.insert(current.clone()) {
                if let Some(next) = self.dependents.get(&current) {
                    stack.extend(next.iter().cloned());
                }
            }
        }

        let mut order = Vec::with_capacity(closure.len());
        let mut placed: BTreeSet<ServiceName> = BTreeSet::new();
        while placed.len() < closure.len() {
            let mut progressed = false;
            for candidate in &closure {
                if placed.contains(candidate) {
                    continue;
                }
                let ready = self
                    .dependencies
                    .get(candidate)
                    .map(|deps| {
                        deps.iter()
                            .all(|d| !closure.contains(d) || placed.contains(d))
                    })
                    .unwrap_or(true);
                if ready {
                    order.push(candidate.clone());
                    placed.insert(candidate.clone());
                    progressed = true;
                }
            }
            // Cycles are rejected at edge insertion, so we always progress.
            debug_assert!(progressed, "dependency graph contains a cycle");
            if !progressed {
                break;
            }
        }
        order
    }

    pub fn service_names(&self) -> Vec<ServiceName> {
        self.dependencies.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_container_and_caches() -> (DependencyGraph, ServiceName, ServiceName, ServiceName) {
        let container = ServiceName::container("web");
        let sessions = ServiceName::cache("web", "sessions");
        let tokens = ServiceName::cache("web", "tokens");
        let mut graph = DependencyGraph::new();
        graph.add_service(container.clone());
        graph.add_service(sessions.clone());
        graph.add_service(tokens.clone());
        graph.add_dependency(&sessions, &container).unwrap();
        graph.add_dependency(&tokens, &container).unwrap();
        (graph, container, sessions, tokens)
    }

    #[test]
    fn stop_order_lists_dependents_first() {
        let (graph, container, sessions, tokens) = graph_with_container_and_caches();
        let order = graph.stop_order(&container);
        assert_eq!(order.len(), 2);
        assert!(order.contains(&sessions));
        assert!(order.contains(&tokens));
        // A cache has no dependents here, so stop and start orders only
        // differ once chains exist.
        assert!(graph.stop_order(&sessions).is_empty());
    }

    #[test]
    fn chained_dependents_are_ordered_by_depth() {
        let (mut graph, container, sessions, _) = graph_with_container_and_caches();
        let backup = ServiceName::cache("web", "sessions-backup");
        graph.add_service(backup.clone());
        graph.add_dependency(&backup, &sessions).unwrap();

        let start = graph.start_order(&container);
        let sessions_idx = start.iter().position(|s| s == &sessions).unwrap();
        let backup_idx = start.iter().position(|s| s == &backup).unwrap();
        assert!(sessions_idx < backup_idx, "dependency must start before dependent");

        let stop = graph.stop_order(&container);
        let sessions_idx = stop.iter().position(|s| s == &sessions).unwrap();
        let backup_idx = stop.iter().position(|s| s == &backup).unwrap();
        assert!(backup_idx < sessions_idx, "dependent must stop before dependency");
    }

    #[test]
    fn cycles_are_rejected() {
        let (mut graph, container, sessions, _) = graph_with_container_and_caches();
        assert!(graph.add_dependency(&container, &sessions).is_err());
        assert!(graph.add_dependency(&container, &container).is_err());
    }

    #[test]
    fn missing_endpoints_are_reported_as_unavailable() {
        let mut graph = DependencyGraph::new();
        let container = ServiceName::container("web");
        graph.add_service(container.clone());
        let err = graph
            .add_dependency(&ServiceName::cache("web", "sessions"), &container)
            .unwrap_err();
        assert!(matches!(err, ManagementError::DependencyUnavailable { .. }));
    }

    #[test]
    fn remove_clears_both_edge_directions() {
        let (mut graph, container, sessions, _) = graph_with_container_and_caches();
        graph.remove_service(&sessions);
        assert!(!graph.contains(&sessions));
        assert!(!graph.stop_order(&container).contains(&sessions));
    }
}
