//! Inventory lookup trait — the read surface the Spot Resolver consumes.
//!
//! Implemented by the campaign store; a trait so delivery stays decoupled
//! from the storage layer and testable against fixture data.

use crate::types::{AdCampaign, AdSpot};

pub trait AdInventory: Send + Sync {
    /// Resolve a spot by its stable technical identifier.
    fn spot_by_technical_id(&self, technical_id: &str) -> Option<AdSpot>;

    /// All campaigns referencing the spot, any status.
    fn campaigns_for_spot(&self, spot_id: u64) -> Vec<AdCampaign>;

    /// Display name of the owning client.
    fn client_name(&self, client_id: u64) -> Option<String>;
}
