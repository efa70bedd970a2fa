//! SpotServe — ad spot scheduling and delivery platform.
//!
//! Main entry point that initializes the store and starts the server.

use clap::Parser;
use spotserve_api::ApiServer;
use spotserve_core::config::AppConfig;
use spotserve_management::CampaignStore;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "spotserve")]
#[command(about = "Ad spot scheduling and delivery platform")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "SPOTSERVE__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "SPOTSERVE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Seed demo spots, clients, and campaigns on startup
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spotserve=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("SpotServe starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        priority_ceiling = config.scheduling.priority_ceiling,
        rotation_default_ms = config.delivery.default_rotation_interval_ms,
        "Configuration loaded"
    );

    // Initialize the campaign store
    let store = Arc::new(CampaignStore::new(config.scheduling.clone()));
    if cli.seed_demo {
        store.seed_demo_data();
    }

    let api_server = ApiServer::new(config, store);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("SpotServe is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
