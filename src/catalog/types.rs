//! Typed attribute values carried by the configuration model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type declared by an attribute descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Bool,
    Long,
    Double,
    String,
    Enum,
    StringList,
    PropertyMap,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Long => "long",
            Self::Double => "double",
            Self::String => "string",
            Self::Enum => "enum",
            Self::StringList => "string list",
            Self::PropertyMap => "property map",
        };
        f.write_str(name)
    }
}

/// A validated configuration value stored in an attribute slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl AttributeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::List(_) => "string list",
            Self::Map(_) => "property map",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            Self::Long(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Map(values) => Some(values),
            _ => None,
        }
    }

    /// Convert a YAML scalar/sequence/mapping into an attribute value. The
    /// catalog validator decides afterwards whether the value fits the slot.
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<AttributeValue> {
        match value {
            serde_yaml::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Long(i))
                } else {
                    n.as_f64().map(Self::Double)
                }
            }
            serde_yaml::Value::String(s) => Some(Self::String(s.clone())),
            serde_yaml::Value::Sequence(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for item in seq {
                    items.push(item.as_str()?.to_string());
                }
                Some(Self::List(items))
            }
            serde_yaml::Value::Mapping(map) => {
                let mut items = BTreeMap::new();
                for (k, v) in map {
                    let key = k.as_str()?.to_string();
                    let value = match v {
                        serde_yaml::Value::String(s) => s.clone(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    items.insert(key, value);
                }
                Some(Self::Map(items))
            }
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::List(v) => write!(f, "[{}]", v.join(", ")),
            Self::Map(v) => {
                let rendered: Vec<String> = v.iter().map(|(k, val)| format!("{k}={val}")).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(AttributeValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AttributeValue::Long(42).as_long(), Some(42));
        assert_eq!(AttributeValue::Long(42).as_double(), Some(42.0));
        assert_eq!(AttributeValue::from("x").as_str(), Some("x"));
        assert_eq!(AttributeValue::Bool(true).as_long(), None);
    }

    #[test]
    fn yaml_conversion() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("[a, b]").unwrap();
        assert_eq!(
            AttributeValue::from_yaml(&yaml),
            Some(AttributeValue::List(vec!["a".to_string(), "b".to_string()]))
        );

        let yaml: serde_yaml::Value = serde_yaml::from_str("key: value").unwrap();
        let map = AttributeValue::from_yaml(&yaml).unwrap();
        assert_eq!(map.as_map().unwrap().get("key"), Some(&"value".to_string()));
    }

    #[test]
    fn value_serde_is_untagged() {
        let json = serde_json::to_string(&AttributeValue::Long(17500)).unwrap();
        assert_eq!(json, "17500");
        let json = serde_json::to_string(&AttributeValue::from("SYNC")).unwrap();
        assert_eq!(json, "\"SYNC\"");
    }
}
