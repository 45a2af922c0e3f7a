//! CCTV event gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p cctv-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use cctv_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Configuration first, so the log format can follow APP_ENV
    let config = AppConfig::from_env()?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        address = %config.gateway.address(),
        "Starting CCTV event gateway"
    );

    cctv_gateway::run(config).await?;

    Ok(())
}
