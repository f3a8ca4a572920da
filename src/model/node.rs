//! One named point in the configuration tree.

use crate::catalog::AttributeValue;
use crate::model::path::{PathSegment, ResourceKind, ResourcePath};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A configuration node: a path, a set of validated attribute slots, and
/// child nodes whose paths strictly extend this node's path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationNode {
    path: ResourcePath,
    attributes: BTreeMap<String, AttributeValue>,
    children: BTreeMap<PathSegment, ConfigurationNode>,
}

impl ConfigurationNode {
    pub fn new(path: ResourcePath, attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            path,
            attributes,
            children: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        // Nodes are only ever created for non-root paths.
        self.path.kind().expect("configuration node with a root path")
    }

    pub fn name(&self) -> &str {
        self.path.name().expect("configuration node with a root path")
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        self.attributes.insert(key.into(), value)
    }

    /// Remove an explicit value, falling back to the catalog default on the
    /// next resolve.
    pub fn unset_attribute(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }

    pub fn children(&self) -> impl Iterator<Item = &ConfigurationNode> {
        self.children.values()
    }

    pub fn child(&self, segment: &PathSegment) -> Option<&ConfigurationNode> {
        self.children.get(segment)
    }

    pub fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut ConfigurationNode> {
        self.children.get_mut(segment)
    }

    pub(crate) fn insert_child(&mut self, node: ConfigurationNode) {
        let segment = node.path.last().expect("child node with a root path").clone();
        self.children.insert(segment, node);
    }

    pub(crate) fn remove_child(&mut self, segment: &PathSegment) -> Option<ConfigurationNode> {
        self.children.remove(segment)
    }

    /// The first child of the given kind, if any. Singleton sub-resources
    /// (locking, memory, ...) are looked up this way.
    pub fn child_of_kind(&self, kind: ResourceKind) -> Option<&ConfigurationNode> {
        self.children.values().find(|c| c.kind() == kind)
    }

    /// All children of store kinds, in path order.
    pub fn store_children(&self) -> impl Iterator<Item = &ConfigurationNode> {
        self.children.values().filter(|c| c.kind().is_store())
    }

    /// All children of cache kinds, in path order.
    pub fn cache_children(&self) -> impl Iterator<Item = &ConfigurationNode> {
        self.children.values().filter(|c| c.kind().is_cache())
    }
}
