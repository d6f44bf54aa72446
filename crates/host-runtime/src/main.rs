//! # Subsystem Host
//!
//! Boots the host runtime from environment configuration, keeps it running
//! until Ctrl+C, then shuts it down.

use anyhow::{Context, Result};
use host_runtime::{HostConfig, HostRuntime};
use host_telemetry::{init_logging, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("Failed to initialize logging")?;

    // Load configuration
    let config = HostConfig::from_env().context("Invalid host configuration")?;

    // Create and start the runtime
    let runtime = HostRuntime::new(config).context("Failed to build host runtime")?;
    runtime.start().await.context("Failed to start host runtime")?;
    runtime.registry().log_status();

    // Keep the host running
    info!("Host is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    // Graceful shutdown
    runtime.shutdown().await;

    Ok(())
}
