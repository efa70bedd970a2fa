//! Management API router — mounts all management endpoints under /api/v1/management.

use crate::handlers::{self, ManagementState};
use axum::routing::{get, post};
use axum::Router;

/// Build the management router. Takes the shared state so the serve-side
/// endpoints and the management surface operate on the same store.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        // Spots
        .route("/api/v1/management/spots", get(handlers::list_spots).post(handlers::create_spot))
        .route("/api/v1/management/spots/:id", get(handlers::get_spot).put(handlers::update_spot).delete(handlers::delete_spot))
        // Clients
        .route("/api/v1/management/clients", get(handlers::list_clients).post(handlers::create_client))
        .route("/api/v1/management/clients/:id", get(handlers::get_client).put(handlers::update_client).delete(handlers::delete_client))
        // Campaigns
        .route("/api/v1/management/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/api/v1/management/campaigns/:id", get(handlers::get_campaign).put(handlers::update_campaign).delete(handlers::delete_campaign))
        .route("/api/v1/management/campaigns/:id/activate", post(handlers::activate_campaign))
        .route("/api/v1/management/campaigns/:id/pause", post(handlers::pause_campaign))
        .route("/api/v1/management/campaigns/:id/complete", post(handlers::complete_campaign))
        .route("/api/v1/management/campaigns/:id/archive", post(handlers::archive_campaign))
        .route("/api/v1/management/campaigns/:id/stats", get(handlers::campaign_stats))
        .with_state(state)
}
