//! CLI command implementations.

mod config;
mod policy;
mod start;

pub use config::{run_config, ConfigArgs, ConfigCommand};
pub use policy::{render_policy, run_policy, PolicyArgs, PolicyFormat};
pub use start::{run_start, StartArgs};

use crate::core::config::{ConfigOverrides, ServerConfig};
use anyhow::{Context, Result};
use std::path::Path;

/// Load a server file and apply CLI overrides.
pub fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<ServerConfig> {
    let mut config = ServerConfig::from_file(path)
        .with_context(|| format!("failed to load config from {:?}", path))?;
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}
