//! REST handlers for the public serving surface: ad resolution, exposure
//! tracking, and availability checks.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spotserve_core::types::{AdResponse, AvailabilityQuery, AvailabilityResult};
use spotserve_delivery::SpotResolver;
use spotserve_management::handlers::error_response;
use spotserve_management::models::ErrorResponse;
use spotserve_management::CampaignStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CampaignStore>,
    pub resolver: Arc<SpotResolver>,
    pub node_id: String,
    pub start_time: Instant,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ─── Serving ───────────────────────────────────────────────────────────────

/// GET /api/v1/ad-spots/{technical_id}/ad — resolve the ad payload for a
/// placement.
pub async fn get_ad(
    State(state): State<AppState>,
    Path(technical_id): Path<String>,
) -> Result<Json<AdResponse>, ApiError> {
    let response = state
        .resolver
        .get_ad(&technical_id)
        .map_err(error_response)?;
    metrics::counter!("api.ads.served").increment(1);
    debug!(
        technical_id = %technical_id,
        campaigns = response.campaigns.len(),
        "ad resolved"
    );
    Ok(Json(response))
}

/// POST /api/v1/campaigns/{id}/track-view — append one view record.
/// Idempotent in intent only; the caller's session-scoped tracker is the
/// dedup layer.
pub async fn track_view(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.record_view(id).map_err(error_response)?;
    metrics::counter!("api.views.tracked").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/campaigns/{id}/track-click — append one click record.
pub async fn track_click(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.record_click(id).map_err(error_response)?;
    metrics::counter!("api.clicks.tracked").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Availability ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityParams {
    pub ad_spot_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: u32,
    #[serde(default)]
    pub exclude_campaign_id: Option<u64>,
}

/// GET /api/v1/campaigns/check-availability — the allocator's verdict for
/// the operator UI, without writing anything.
pub async fn check_availability(
    State(state): State<AppState>,
    Query(params): Query<CheckAvailabilityParams>,
) -> Result<Json<AvailabilityResult>, ApiError> {
    let query = AvailabilityQuery {
        spot_id: params.ad_spot_id,
        start_date: params.start_date,
        end_date: params.end_date,
        priority: params.priority,
        exclude_campaign_id: params.exclude_campaign_id,
    };
    state
        .store
        .check_availability(&query)
        .map(Json)
        .map_err(error_response)
}

// ─── Probes ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
