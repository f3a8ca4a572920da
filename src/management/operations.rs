//! Inbound management operations.
//!
//! The host pipeline hands the core `(operation kind, path, attributes)`
//! triples; each call executes to completion and answers with a structured
//! response or a human-readable failure.

use crate::catalog::AttributeValue;
use crate::metrics::MetricValue;
use crate::model::path::ResourcePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Add,
    Remove,
    WriteAttribute,
    ReadAttribute,
    ReadMetric,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::WriteAttribute => "write-attribute",
            Self::ReadAttribute => "read-attribute",
            Self::ReadMetric => "read-metric",
        };
        f.write_str(name)
    }
}

/// One management operation against the configuration model.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: Uuid,
    pub kind: OperationKind,
    pub path: ResourcePath,
    /// Full attribute map for `add`.
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Target attribute/metric for write-attribute, read-attribute, and
    /// read-metric.
    pub attribute: Option<String>,
    /// New value for write-attribute.
    pub value: Option<AttributeValue>,
}

impl Operation {
    pub fn add(path: ResourcePath, attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::Add,
            path,
            attributes,
            attribute: None,
            value: None,
        }
    }

    pub fn remove(path: ResourcePath) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::Remove,
            path,
            attributes: BTreeMap::new(),
            attribute: None,
            value: None,
        }
    }

    pub fn write_attribute(
        path: ResourcePath,
        attribute: impl Into<String>,
        value: AttributeValue,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::WriteAttribute,
            path,
            attributes: BTreeMap::new(),
            attribute: Some(attribute.into()),
            value: Some(value),
        }
    }

    pub fn read_attribute(path: ResourcePath, attribute: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::ReadAttribute,
            path,
            attributes: BTreeMap::new(),
            attribute: Some(attribute.into()),
            value: None,
        }
    }

    pub fn read_metric(path: ResourcePath, metric: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::ReadMetric,
            path,
            attributes: BTreeMap::new(),
            attribute: Some(metric.into()),
            value: None,
        }
    }
}

/// Successful outcome of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResponse {
    /// Add, remove, write-attribute.
    Done,
    /// Read-attribute: the resolved value, or `None` when neither an
    /// explicit value nor a default exists.
    Value(Option<AttributeValue>),
    /// Read-metric.
    Metric(MetricValue),
}

impl OperationResponse {
    pub fn into_value(self) -> Option<AttributeValue> {
        match self {
            Self::Value(value) => value,
            _ => None,
        }
    }

    pub fn into_metric(self) -> Option<MetricValue> {
        match self {
            Self::Metric(value) => Some(value),
            _ => None,
        }
    }
}
