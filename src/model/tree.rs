//! The stored configuration model.
//!
//! The tree is mutated only within a single management operation; the host
//! pipeline serializes operations, so no internal locking is carried here.

use crate::catalog::AttributeValue;
use crate::error::{ManagementError, Result};
use crate::model::node::ConfigurationNode;
use crate::model::path::{PathSegment, ResourcePath};
use std::collections::BTreeMap;

/// Root of the configuration model. Top-level nodes are cache containers.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationTree {
    roots: BTreeMap<PathSegment, ConfigurationNode>,
}

impl ConfigurationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. The parent must already exist and must allow the new
    /// node's kind as a child; the path itself must be free.
    pub fn insert(
        &mut self,
        path: &ResourcePath,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Result<()> {
        let segment = path
            .last()
            .ok_or_else(|| ManagementError::Configuration("Cannot add the root".to_string()))?
            .clone();
        let parent_path = path.parent().expect("non-root path has a parent");

        if parent_path.is_root() {
            if segment.kind != crate::model::path::ResourceKind::CacheContainer {
                return Err(ManagementError::Configuration(format!(
                    "Only cache containers may be registered at the top level, got '{}'",
                    segment.kind
                )));
            }
            if self.roots.contains_key(&segment) {
                return Err(ManagementError::DuplicateResource(path.to_string()));
            }
            self.roots
                .insert(segment, ConfigurationNode::new(path.clone(), attributes));
            return Ok(());
        }

        let parent = self
            .node_mut(&parent_path)
            .ok_or_else(|| ManagementError::ResourceNotFound(parent_path.to_string()))?;
        if !parent.kind().allows_child(segment.kind) {
            return Err(ManagementError::Configuration(format!(
                "'{}' does not allow a '{}' child",
                parent.kind(),
                segment.kind
            )));
        }
        if parent.child(&segment).is_some() {
            return Err(ManagementError::DuplicateResource(path.to_string()));
        }
        parent.insert_child(ConfigurationNode::new(path.clone(), attributes));
        Ok(())
    }

    /// Remove a node and its descendants, returning the removed subtree.
    pub fn remove(&mut self, path: &ResourcePath) -> Result<ConfigurationNode> {
        let segment = path
            .last()
            .ok_or_else(|| ManagementError::Configuration("Cannot remove the root".to_string()))?
            .clone();
        let parent_path = path.parent().expect("non-root path has a parent");

        if parent_path.is_root() {
            return self
                .roots
                .remove(&segment)
                .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()));
        }

        let parent = self
            .node_mut(&parent_path)
            .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))?;
        parent
            .remove_child(&segment)
            .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))
    }

    pub fn node(&self, path: &ResourcePath) -> Option<&ConfigurationNode> {
        let mut segments = path.segments().iter();
        let first = segments.next()?;
        let mut current = self.roots.get(first)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    pub fn node_mut(&mut self, path: &ResourcePath) -> Option<&mut ConfigurationNode> {
        let mut segments = path.segments().iter();
        let first = segments.next()?;
        let mut current = self.roots.get_mut(first)?;
        for segment in segments {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &ResourcePath) -> bool {
        self.node(path).is_some()
    }

    /// Deep snapshot of a node and all descendants, the full current model
    /// a recreate replays through the translator.
    pub fn subtree_model(&self, path: &ResourcePath) -> Result<ConfigurationNode> {
        self.node(path)
            .cloned()
            .ok_or_else(|| ManagementError::ResourceNotFound(path.to_string()))
    }

    pub fn containers(&self) -> impl Iterator<Item = &ConfigurationNode> {
        self.roots.values()
    }
}
