//! # slugline relay
//!
//! Realtime collaboration relay for slugline screenplay editors.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! slugline
//!
//! # Run with a config file in the working directory
//! echo 'port = 9000' > slugline.toml && slugline
//!
//! # Run with environment variables
//! SLUGLINE_PORT=8080 SLUGLINE_HOST=0.0.0.0 slugline
//! ```

mod config;
mod handlers;
mod metrics;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slugline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting slugline relay on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
