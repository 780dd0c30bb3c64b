//! Subjects, permissions and the authorization check.

use super::context::Security;
use crate::core::config::GlobalSecurityConfiguration;
use crate::core::error::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Permissions checked by secured caches and managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationPermission {
    Read,
    Write,
    Listen,
    Admin,
    Monitor,
    /// Implies every other permission.
    All,
}

impl AuthorizationPermission {
    /// Check if holding `self` grants `other`.
    pub fn implies(&self, other: AuthorizationPermission) -> bool {
        *self == Self::All || *self == other
    }
}

impl std::fmt::Display for AuthorizationPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "READ"),
            Self::Write => write!(f, "WRITE"),
            Self::Listen => write!(f, "LISTEN"),
            Self::Admin => write!(f, "ADMIN"),
            Self::Monitor => write!(f, "MONITOR"),
            Self::All => write!(f, "ALL"),
        }
    }
}

/// An authenticated caller and the roles it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    name: String,
    roles: BTreeSet<String>,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

const ANONYMOUS: &str = "<anonymous>";

/// Maps subjects to permissions through the configured roles.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    enabled: bool,
    roles: BTreeMap<String, BTreeSet<AuthorizationPermission>>,
}

impl Authorizer {
    pub fn from_config(config: &GlobalSecurityConfiguration) -> Self {
        Self {
            enabled: config.authorization,
            roles: config.roles.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if the subject's roles grant the permission.
    pub fn grants(&self, subject: &Subject, permission: AuthorizationPermission) -> bool {
        subject
            .roles()
            .filter_map(|role| self.roles.get(role))
            .flatten()
            .any(|held| held.implies(permission))
    }

    /// Check a permission for a subject.
    ///
    /// Passes when authorization is disabled or the thread is privileged.
    pub fn check_permission(
        &self,
        subject: Option<&Subject>,
        permission: AuthorizationPermission,
    ) -> GridResult<()> {
        if !self.enabled || Security::is_privileged() {
            return Ok(());
        }

        match subject {
            Some(subject) if self.grants(subject, permission) => Ok(()),
            Some(subject) => {
                tracing::debug!(subject = %subject.name(), %permission, "authorization denied");
                Err(GridError::permission_denied(subject.name(), permission))
            }
            None => {
                tracing::debug!(%permission, "authorization denied for anonymous caller");
                Err(GridError::permission_denied(ANONYMOUS, permission))
            }
        }
    }

    /// Check a permission for the thread's current subject.
    pub fn check_current(&self, permission: AuthorizationPermission) -> GridResult<()> {
        self.check_permission(Security::current_subject().as_ref(), permission)
    }
}
