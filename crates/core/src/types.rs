//! Domain types — ad spots, clients, campaigns, availability checking.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Ad Spot ───────────────────────────────────────────────────────────────

/// A named page placement that campaigns reserve slots on.
/// The `technical_id` is the stable string embedded in page templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSpot {
    pub id: u64,
    pub technical_id: String,
    pub name: String,
    pub dimensions: Option<Dimensions>,
    /// Rotation interval served to placements; config default when unset.
    pub rotation_interval_ms: Option<u64>,
    /// Maximum campaigns returned per serve; config default when unset.
    pub max_slots: Option<u32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

// ─── Client ────────────────────────────────────────────────────────────────

/// An advertiser/business entity owning campaigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdCampaign {
    pub id: u64,
    pub spot_id: u64,
    pub client_id: u64,
    pub name: String,
    /// Priority slot on the spot, 1 = highest precedence. Unique within a
    /// spot for any overlapping date interval.
    pub priority: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
    pub media_url: String,
    pub mobile_media_url: Option<String>,
    pub destination_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

impl CampaignStatus {
    /// Statuses that still hold a slot reservation and participate in
    /// availability checks.
    pub fn holds_slot(self) -> bool {
        matches!(self, Self::Draft | Self::Active | Self::Paused)
    }
}

impl AdCampaign {
    /// Whether this campaign may serve on the given date. The caller is
    /// responsible for also checking the owning spot's active flag.
    pub fn is_eligible_on(&self, date: NaiveDate) -> bool {
        self.status == CampaignStatus::Active
            && self.start_date <= date
            && date <= self.end_date
    }

    /// Half-open-free interval overlap test used by the allocator.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

// ─── Availability ──────────────────────────────────────────────────────────

/// Query for the slot allocator: is `priority` free on `spot_id` during
/// the given interval?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub spot_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: u32,
    /// Set on update so a campaign never conflicts with itself.
    pub exclude_campaign_id: Option<u64>,
}

/// Allocator verdict plus everything an operator needs to resolve a
/// conflict: which priorities are taken, which are free, and by whom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub is_available: bool,
    pub priority_taken: bool,
    pub taken_priorities: Vec<u32>,
    pub available_priorities: Vec<u32>,
    pub overlapping_campaigns: Vec<OverlappingCampaign>,
    pub max_campaigns_reached: bool,
}

/// Conflicting-campaign record for operator display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlappingCampaign {
    pub id: u64,
    pub name: String,
    pub client_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: u32,
}

// ─── Exposure events ───────────────────────────────────────────────────────

/// A single accepted view or click, forwarded to the campaign counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureEvent {
    pub event_id: Uuid,
    pub event_type: ExposureType,
    pub campaign_id: u64,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExposureType {
    View,
    Click,
}

// ─── Serving ───────────────────────────────────────────────────────────────

/// Campaign fields exposed to placements at serve time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServedCampaign {
    pub id: u64,
    pub name: String,
    pub media_url: String,
    pub mobile_media_url: Option<String>,
    pub destination_url: String,
    pub priority: u32,
    pub client_name: String,
}

/// Response to `GET /ad-spots/{technical_id}/ad`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdResponse {
    pub spot_id: u64,
    pub spot_name: String,
    pub dimensions: Option<Dimensions>,
    pub rotation_interval_ms: u64,
    pub campaigns: Vec<ServedCampaign>,
    /// Eligible count before truncation to the spot's slot cap.
    pub total_campaigns: usize,
}
