use crate::types::{AvailabilityResult, OverlappingCampaign};
use thiserror::Error;

pub type SpotServeResult<T> = Result<T, SpotServeError>;

#[derive(Error, Debug)]
pub enum SpotServeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Priority {priority} is not available on spot {spot_id} for the requested period")]
    SlotConflict {
        spot_id: u64,
        priority: u32,
        availability: Box<AvailabilityResult>,
    },

    #[error("Spot {spot_id} still has {} non-archived campaign(s)", blocking.len())]
    SpotInUse {
        spot_id: u64,
        blocking: Vec<OverlappingCampaign>,
    },

    #[error("Client {client_id} still has {campaign_count} campaign(s)")]
    ClientInUse { client_id: u64, campaign_count: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SpotServeError {
    /// Write-path conflicts; never auto-retried by callers.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SlotConflict { .. } | Self::SpotInUse { .. } | Self::ClientInUse { .. }
        )
    }
}
