//! Management request/response DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spotserve_core::types::{AvailabilityResult, Dimensions, OverlappingCampaign};

// ─── Spots ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpotRequest {
    pub technical_id: String,
    pub name: String,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub rotation_interval_ms: Option<u64>,
    #[serde(default)]
    pub max_slots: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateSpotRequest {
    pub name: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub rotation_interval_ms: Option<u64>,
    pub max_slots: Option<u32>,
    pub active: Option<bool>,
}

// ─── Clients ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub active: Option<bool>,
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub spot_id: u64,
    pub client_id: u64,
    pub name: String,
    pub priority: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub media_url: String,
    #[serde(default)]
    pub mobile_media_url: Option<String>,
    pub destination_url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub priority: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub media_url: Option<String>,
    pub mobile_media_url: Option<String>,
    pub destination_url: Option<String>,
}

/// Aggregate counters derived from the append-only view/click records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignStats {
    pub campaign_id: u64,
    pub views: u64,
    pub clicks: u64,
    pub ctr: f64,
}

// ─── Errors ────────────────────────────────────────────────────────────────

/// Wire error body. Conflict responses carry the allocator's verdict or the
/// blocking-campaign list so operators see actionable detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_campaigns: Option<Vec<OverlappingCampaign>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            availability: None,
            blocking_campaigns: None,
        }
    }
}
