//! Error types shared by the runtime, the privilege gate and the protocol server.
//!
//! Policy resolution has no error paths. Privileged operations surface the
//! error the underlying operation produced, untouched; the only gate-specific
//! failure is [`GridError::ElevationDenied`].

use crate::security::authz::AuthorizationPermission;
use thiserror::Error;

/// Common gridcache error conditions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// No cache with this name has been defined on the manager.
    #[error("cache not found: {name}")]
    CacheNotFound { name: String },

    /// The cache exists but has been stopped.
    #[error("cache {name} is not running")]
    CacheNotRunning { name: String },

    /// The effective subject lacks a permission required by the operation.
    #[error("subject '{subject}' lacks permission {permission}")]
    PermissionDenied {
        subject: String,
        permission: AuthorizationPermission,
    },

    /// A runtime component the caller asked for does not exist for this cache.
    #[error("component unavailable: {component}")]
    ComponentUnavailable { component: String },

    /// Standing enforcement refused to elevate the gate's code domain.
    #[error("elevation denied for code domain {domain}")]
    ElevationDenied { domain: String },

    /// The process-wide enforcement switch was already selected.
    #[error("process enforcement already installed")]
    EnforcementAlreadyInstalled,

    /// A client listener may only be removed by the subject that registered it.
    #[error("listener {id} was registered by another subject")]
    ListenerNotOwned { id: u64 },

    /// A listener removal handle was dropped before the removal completed.
    #[error("listener removal aborted before completion")]
    ListenerRemovalAborted,

    /// The configuration violates a structural rule.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl GridError {
    /// Create a PermissionDenied error.
    pub fn permission_denied(subject: impl Into<String>, permission: AuthorizationPermission) -> Self {
        Self::PermissionDenied {
            subject: subject.into(),
            permission,
        }
    }

    /// Create a ComponentUnavailable error.
    pub fn component_unavailable(component: impl Into<String>) -> Self {
        Self::ComponentUnavailable {
            component: component.into(),
        }
    }

    /// Check if this error was raised by an authorization check.
    pub fn is_security_failure(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. }
                | Self::ElevationDenied { .. }
                | Self::ListenerNotOwned { .. }
        )
    }
}

/// Result type using GridError.
pub type GridResult<T> = Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GridError::CacheNotFound {
            name: "orders".to_string(),
        };
        assert_eq!(err.to_string(), "cache not found: orders");

        let err = GridError::permission_denied("alice", AuthorizationPermission::Admin);
        assert_eq!(err.to_string(), "subject 'alice' lacks permission ADMIN");
    }

    #[test]
    fn test_security_failure_classification() {
        assert!(GridError::permission_denied("bob", AuthorizationPermission::Read)
            .is_security_failure());
        assert!(GridError::ElevationDenied {
            domain: "x".to_string()
        }
        .is_security_failure());
        assert!(GridError::ListenerNotOwned { id: 1 }.is_security_failure());
        assert!(!GridError::ListenerRemovalAborted.is_security_failure());
    }
}
