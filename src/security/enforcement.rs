//! Process-wide enforcement switch.
//!
//! Selected once at process start and read-only afterwards. It decides which
//! elevation primitive the privilege gate uses; both primitives run the same
//! action.

use super::context::PrivilegedScope;
use crate::core::error::{GridError, GridResult};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

/// Code domain the privilege gate elevates as.
pub const SERVER_CODE_DOMAIN: &str = "gridcache.server";

static PROCESS_ENFORCEMENT: OnceLock<Arc<Enforcement>> = OnceLock::new();

/// Standing policy: which code domains may elevate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandingPolicy {
    elevation_grants: BTreeSet<String>,
}

impl StandingPolicy {
    /// A policy that grants nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_elevation(mut self, domain: impl Into<String>) -> Self {
        self.elevation_grants.insert(domain.into());
        self
    }

    pub fn grants_elevation(&self, domain: &str) -> bool {
        self.elevation_grants.contains(domain)
    }
}

/// Enforcement mode of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Enforcement {
    /// No standing enforcement; elevation is always available.
    #[default]
    Absent,
    /// Standing enforcement; elevation requires a grant for the code domain.
    Standing(StandingPolicy),
}

impl Enforcement {
    pub fn is_standing(&self) -> bool {
        matches!(self, Self::Standing(_))
    }

    /// Acquire elevation for `domain`, held until the returned scope drops.
    pub(crate) fn elevate(&self, domain: &str) -> GridResult<PrivilegedScope> {
        match self {
            Self::Absent => Ok(PrivilegedScope::enter()),
            Self::Standing(policy) if policy.grants_elevation(domain) => {
                Ok(PrivilegedScope::enter())
            }
            Self::Standing(_) => {
                tracing::warn!(domain, "standing enforcement refused elevation");
                Err(GridError::ElevationDenied {
                    domain: domain.to_string(),
                })
            }
        }
    }
}

/// Select the process enforcement mode.
///
/// Fails if a mode was already installed or already read (reading fixes the
/// default, [`Enforcement::Absent`]).
pub fn install(enforcement: Enforcement) -> GridResult<()> {
    let standing = enforcement.is_standing();
    PROCESS_ENFORCEMENT
        .set(Arc::new(enforcement))
        .map_err(|_| GridError::EnforcementAlreadyInstalled)?;
    tracing::info!(standing, "process enforcement installed");
    Ok(())
}

/// The process enforcement mode.
pub fn process_enforcement() -> Arc<Enforcement> {
    Arc::clone(PROCESS_ENFORCEMENT.get_or_init(|| Arc::new(Enforcement::Absent)))
}
