//! # Structured Error Handling
//!
//! Central error taxonomy for the management core. Validation failures are
//! rejected before any model mutation; service installation failures are
//! surfaced only after the lifecycle controller has attempted rollback to the
//! last-known-good model.

use thiserror::Error;

/// Errors surfaced by management operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagementError {
    /// Operation referenced an attribute key not present in the catalog.
    #[error("Unknown attribute '{attribute}' on resource '{resource}'")]
    UnknownAttribute { resource: String, attribute: String },

    /// Supplied value failed the attribute's type/range/enum validation.
    #[error("Invalid value for attribute '{attribute}': {reason}")]
    InvalidAttributeValue { attribute: String, reason: String },

    /// Operation targeted a path with no corresponding configuration node.
    #[error("No resource registered at '{0}'")]
    ResourceNotFound(String),

    /// Add operation targeted a path that already holds a node.
    #[error("Resource already registered at '{0}'")]
    DuplicateResource(String),

    /// Configuration rebuild or service installation failed during an add or
    /// a recreate. The lifecycle controller attempts recovery before this
    /// error reaches the caller.
    #[error("Service installation failed for '{service}': {reason}")]
    ServiceInstallationFailure { service: String, reason: String },

    /// A required collaborator service is not present or not running at
    /// install time.
    #[error("Dependency '{dependency}' of service '{service}' is unavailable")]
    DependencyUnavailable { service: String, dependency: String },

    /// A service was driven through an edge its state machine does not allow.
    #[error("Invalid state transition for '{service}': {from} does not accept {event}")]
    InvalidStateTransition {
        service: String,
        from: String,
        event: String,
    },

    /// Bootstrap definition could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ManagementError {
    /// Shorthand used by validators.
    pub fn invalid_value(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttributeValue {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand used by the installer and the lifecycle controller.
    pub fn installation(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ServiceInstallationFailure {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ManagementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = ManagementError::UnknownAttribute {
            resource: "cache-container=web".to_string(),
            attribute: "no-such-key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown attribute 'no-such-key' on resource 'cache-container=web'"
        );

        let err = ManagementError::invalid_value("size", "expected a long >= -1");
        assert!(err.to_string().contains("expected a long >= -1"));
    }
}
