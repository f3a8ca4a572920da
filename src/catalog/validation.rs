//! Per-slot validation rules.
//!
//! Every rule rejects before any model mutation happens; a failed validation
//! never reaches the service layer.

use super::types::AttributeValue;
use crate::error::{ManagementError, Result};

/// Validation rule attached to an attribute descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// Boolean slot.
    Bool,
    /// Integer slot with an inclusive range.
    LongRange { min: i64, max: i64 },
    /// Double slot.
    Double,
    /// Non-empty string slot.
    NonEmptyString,
    /// String slot restricted to a fixed set of values.
    EnumValues(&'static [&'static str]),
    /// List of non-empty strings.
    StringList,
    /// String-to-string property bag.
    PropertyMap,
}

impl Validator {
    pub fn validate(&self, attribute: &str, value: &AttributeValue) -> Result<()> {
        match (self, value) {
            (Self::Bool, AttributeValue::Bool(_)) => Ok(()),
            (Self::LongRange { min, max }, AttributeValue::Long(v)) => {
                if v < min || v > max {
                    Err(ManagementError::invalid_value(
                        attribute,
                        format!("{v} is outside the allowed range [{min}, {max}]"),
                    ))
                } else {
                    Ok(())
                }
            }
            (Self::Double, AttributeValue::Double(_) | AttributeValue::Long(_)) => Ok(()),
            (Self::NonEmptyString, AttributeValue::String(v)) => {
                if v.is_empty() {
                    Err(ManagementError::invalid_value(attribute, "value must not be empty"))
                } else {
                    Ok(())
                }
            }
            (Self::EnumValues(allowed), AttributeValue::String(v)) => {
                if allowed.contains(&v.as_str()) {
                    Ok(())
                } else {
                    Err(ManagementError::invalid_value(
                        attribute,
                        format!("'{v}' is not one of {}", allowed.join(", ")),
                    ))
                }
            }
            (Self::StringList, AttributeValue::List(items)) => {
                if items.iter().any(String::is_empty) {
                    Err(ManagementError::invalid_value(
                        attribute,
                        "list entries must not be empty",
                    ))
                } else {
                    Ok(())
                }
            }
            (Self::PropertyMap, AttributeValue::Map(_)) => Ok(()),
            (expected, actual) => Err(ManagementError::invalid_value(
                attribute,
                format!("expected {}, got {}", expected.expected_type(), actual.type_name()),
            )),
        }
    }

    fn expected_type(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::LongRange { .. } => "long",
            Self::Double => "double",
            Self::NonEmptyString => "string",
            Self::EnumValues(_) => "enum string",
            Self::StringList => "string list",
            Self::PropertyMap => "property map",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_validation() {
        let rule = Validator::LongRange { min: 0, max: 100 };
        assert!(rule.validate("size", &AttributeValue::Long(50)).is_ok());
        assert!(rule.validate("size", &AttributeValue::Long(101)).is_err());
        assert!(rule.validate("size", &AttributeValue::Bool(true)).is_err());
    }

    #[test]
    fn enum_validation() {
        let rule = Validator::EnumValues(&["SYNC", "ASYNC"]);
        assert!(rule.validate("mode", &AttributeValue::from("SYNC")).is_ok());
        let err = rule
            .validate("mode", &AttributeValue::from("HALF_SYNC"))
            .unwrap_err();
        assert!(err.to_string().contains("not one of"));
    }

    #[test]
    fn type_mismatch_names_both_types() {
        let rule = Validator::Bool;
        let err = rule.validate("statistics", &AttributeValue::Long(1)).unwrap_err();
        assert!(err.to_string().contains("expected bool, got long"));
    }
}
