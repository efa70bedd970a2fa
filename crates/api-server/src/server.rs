//! API server — wires the serving surface and the management API onto one
//! HTTP listener, plus the Prometheus metrics exporter.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use spotserve_core::config::AppConfig;
use spotserve_delivery::SpotResolver;
use spotserve_management::handlers::ManagementState;
use spotserve_management::router::management_router;
use spotserve_management::CampaignStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    store: Arc<CampaignStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<CampaignStore>) -> Self {
        Self { config, store }
    }

    /// Build the full application router.
    pub fn router(&self) -> Router {
        let resolver = Arc::new(SpotResolver::new(
            self.store.clone(),
            self.config.delivery.clone(),
        ));
        let state = AppState {
            store: self.store.clone(),
            resolver,
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
        };

        Router::new()
            // Serving surface
            .route("/api/v1/ad-spots/:technical_id/ad", get(rest::get_ad))
            .route("/api/v1/campaigns/:id/track-view", post(rest::track_view))
            .route("/api/v1/campaigns/:id/track-click", post(rest::track_click))
            .route("/api/v1/campaigns/check-availability", get(rest::check_availability))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            .with_state(state)
            // Management surface shares the same store
            .merge(management_router(ManagementState {
                store: self.store.clone(),
            }))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP server (blocks until shutdown).
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
