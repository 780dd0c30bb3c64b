//! Start command implementation.

use crate::core::config::ServerConfig;
use crate::runtime::manager::CacheManager;
use crate::server::ProtocolServer;
use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;

/// Start the cache manager and protocol server.
#[derive(Args, Debug)]
pub struct StartArgs {
    // No additional arguments - config is handled globally
}

/// Run until interrupted with the given configuration.
pub async fn run_start(config: ServerConfig, _args: StartArgs) -> Result<()> {
    let manager = Arc::new(
        CacheManager::from_server_config(&config).context("failed to start caches")?,
    );
    let server = ProtocolServer::start(Arc::clone(&manager))
        .context("failed to start protocol server")?;

    for name in manager.cache_names() {
        let info = server.cache_info(&name)?;
        tracing::info!(
            cache = %name,
            mode = %info.cache_mode(),
            commit_protocol = %info.policy.commit_protocol,
            segments = info.segment_count(),
            "serving cache"
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");

    server.stop().await?;
    Ok(())
}
