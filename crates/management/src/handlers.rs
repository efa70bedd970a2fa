//! Axum REST handlers for the management API.

use crate::models::*;
use crate::store::CampaignStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use spotserve_core::types::{AdCampaign, AdSpot, Client};
use spotserve_core::SpotServeError;
use std::sync::Arc;
use tracing::warn;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<CampaignStore>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map the error taxonomy onto HTTP. Conflicts carry their payload so the
/// operator UI can render the conflicting campaigns verbatim.
pub fn error_response(err: SpotServeError) -> ApiError {
    match err {
        SpotServeError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("validation_failed", msg)),
        ),
        SpotServeError::SlotConflict {
            spot_id,
            priority,
            availability,
        } => {
            let mut body = ErrorResponse::new(
                "slot_conflict",
                format!(
                    "priority {} is not available on spot {} for the requested period",
                    priority, spot_id
                ),
            );
            body.availability = Some(*availability);
            (StatusCode::CONFLICT, Json(body))
        }
        SpotServeError::SpotInUse { spot_id, blocking } => {
            let mut body = ErrorResponse::new(
                "spot_in_use",
                format!(
                    "spot {} still has {} non-archived campaign(s); archive them first",
                    spot_id,
                    blocking.len()
                ),
            );
            body.blocking_campaigns = Some(blocking);
            (StatusCode::CONFLICT, Json(body))
        }
        SpotServeError::ClientInUse {
            client_id,
            campaign_count,
        } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                "client_in_use",
                format!("client {} still has {} campaign(s)", client_id, campaign_count),
            )),
        ),
        SpotServeError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("not_found", what)),
        ),
        SpotServeError::Transient(msg) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("transient", msg)),
        ),
        other => {
            warn!(error = %other, "unexpected error on management path");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal", "internal error")),
            )
        }
    }
}

// ─── Spots ─────────────────────────────────────────────────────────────────

pub async fn list_spots(State(state): State<ManagementState>) -> Json<Vec<AdSpot>> {
    Json(state.store.list_spots())
}

pub async fn get_spot(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<AdSpot>, StatusCode> {
    state.store.get_spot(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_spot(
    State(state): State<ManagementState>,
    Json(req): Json<CreateSpotRequest>,
) -> Result<(StatusCode, Json<AdSpot>), ApiError> {
    let spot = state.store.create_spot(req).map_err(error_response)?;
    metrics::counter!("management.spots.created").increment(1);
    Ok((StatusCode::CREATED, Json(spot)))
}

pub async fn update_spot(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateSpotRequest>,
) -> Result<Json<AdSpot>, ApiError> {
    state.store.update_spot(id, req).map(Json).map_err(error_response)
}

pub async fn delete_spot(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_spot(id).map_err(error_response)?;
    metrics::counter!("management.spots.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Clients ───────────────────────────────────────────────────────────────

pub async fn list_clients(State(state): State<ManagementState>) -> Json<Vec<Client>> {
    Json(state.store.list_clients())
}

pub async fn get_client(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<Client>, StatusCode> {
    state.store.get_client(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_client(
    State(state): State<ManagementState>,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = state.store.create_client(req).map_err(error_response)?;
    metrics::counter!("management.clients.created").increment(1);
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateClientRequest>,
) -> Result<Json<Client>, ApiError> {
    state.store.update_client(id, req).map(Json).map_err(error_response)
}

pub async fn delete_client(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_client(id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<ManagementState>) -> Json<Vec<AdCampaign>> {
    Json(state.store.list_campaigns())
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<AdCampaign>, StatusCode> {
    state.store.get_campaign(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_campaign(
    State(state): State<ManagementState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<AdCampaign>), ApiError> {
    let campaign = state.store.create_campaign(req).map_err(error_response)?;
    metrics::counter!("management.campaigns.created").increment(1);
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn update_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<AdCampaign>, ApiError> {
    state.store.update_campaign(id, req).map(Json).map_err(error_response)
}

pub async fn delete_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> StatusCode {
    if state.store.delete_campaign(id) {
        metrics::counter!("management.campaigns.deleted").increment(1);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn activate_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<AdCampaign>, ApiError> {
    state.store.activate_campaign(id).map(Json).map_err(error_response)
}

pub async fn pause_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<AdCampaign>, ApiError> {
    state.store.pause_campaign(id).map(Json).map_err(error_response)
}

pub async fn complete_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<AdCampaign>, ApiError> {
    state.store.complete_campaign(id).map(Json).map_err(error_response)
}

pub async fn archive_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<AdCampaign>, ApiError> {
    state.store.archive_campaign(id).map(Json).map_err(error_response)
}

pub async fn campaign_stats(
    State(state): State<ManagementState>,
    Path(id): Path<u64>,
) -> Result<Json<CampaignStats>, ApiError> {
    state.store.campaign_stats(id).map(Json).map_err(error_response)
}
