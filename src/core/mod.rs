//! Core infrastructure.
//!
//! - [`config`] - Cache and cluster configuration, TOML loading and validation
//! - [`error`] - Error types
//! - [`metadata`] - Entry expiration metadata

pub mod config;
pub mod error;
pub mod metadata;
