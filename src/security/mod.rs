//! Authorization and privilege elevation.
//!
//! - [`authz`] - Permissions, subjects and the role-based authorizer
//! - [`context`] - Thread-local subject stack and privileged scope
//! - [`enforcement`] - Process-wide enforcement switch
//! - `actions` - Closed catalogue of privileged actions
//! - `gate` - Privilege gate used by the protocol server
//!
//! The gate and its actions are crate-private. Code outside this crate can
//! neither build a gate nor name an action:
//!
//! ```compile_fail
//! use gridcache::security::gate::PrivilegeGate;
//! ```
//!
//! ```compile_fail
//! use gridcache::gate::PrivilegeGate;
//! ```
//!
//! ```compile_fail
//! use gridcache::security::actions::ActionKind;
//! ```

pub(crate) mod actions;
pub mod authz;
pub mod context;
pub mod enforcement;
pub(crate) mod gate;

pub use authz::{AuthorizationPermission, Authorizer, Subject};
pub use context::Security;
pub use enforcement::{install, process_enforcement, Enforcement, StandingPolicy, SERVER_CODE_DOMAIN};
