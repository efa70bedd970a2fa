//! Spot resolver — turns a spot's technical identifier into the ordered set
//! of campaigns eligible to serve, plus the spot's rotation configuration.

use chrono::{NaiveDate, Utc};
use spotserve_core::config::DeliveryConfig;
use spotserve_core::inventory::AdInventory;
use spotserve_core::types::{AdResponse, ServedCampaign};
use spotserve_core::{SpotServeError, SpotServeResult};
use std::sync::Arc;
use tracing::debug;

pub struct SpotResolver {
    inventory: Arc<dyn AdInventory>,
    config: DeliveryConfig,
}

impl SpotResolver {
    pub fn new(inventory: Arc<dyn AdInventory>, config: DeliveryConfig) -> Self {
        Self { inventory, config }
    }

    /// Resolve the ad payload for a placement. Unknown technical id is
    /// NotFound; a known spot with nothing eligible returns an empty
    /// campaign list so the placement renders a neutral state.
    pub fn get_ad(&self, technical_id: &str) -> SpotServeResult<AdResponse> {
        self.get_ad_on(technical_id, Utc::now().date_naive())
    }

    /// Date-injectable variant of [`get_ad`](Self::get_ad).
    pub fn get_ad_on(&self, technical_id: &str, date: NaiveDate) -> SpotServeResult<AdResponse> {
        let spot = self
            .inventory
            .spot_by_technical_id(technical_id)
            .ok_or_else(|| SpotServeError::NotFound(format!("spot '{}'", technical_id)))?;

        let mut eligible = if spot.active {
            self.inventory
                .campaigns_for_spot(spot.id)
                .into_iter()
                .filter(|c| c.is_eligible_on(date))
                .collect()
        } else {
            Vec::new()
        };
        // Lowest priority number serves first; id breaks ties for determinism.
        eligible.sort_by_key(|c| (c.priority, c.id));

        let total_campaigns = eligible.len();
        let max_slots = spot.max_slots.unwrap_or(self.config.default_max_slots) as usize;
        eligible.truncate(max_slots);

        let campaigns: Vec<ServedCampaign> = eligible
            .into_iter()
            .map(|c| {
                let client_name = self.inventory.client_name(c.client_id).unwrap_or_default();
                ServedCampaign {
                    id: c.id,
                    name: c.name,
                    media_url: c.media_url,
                    mobile_media_url: c.mobile_media_url,
                    destination_url: c.destination_url,
                    priority: c.priority,
                    client_name,
                }
            })
            .collect();

        debug!(
            technical_id,
            spot_id = spot.id,
            served = campaigns.len(),
            total = total_campaigns,
            "spot resolved"
        );

        Ok(AdResponse {
            spot_id: spot.id,
            spot_name: spot.name,
            dimensions: spot.dimensions,
            rotation_interval_ms: spot
                .rotation_interval_ms
                .unwrap_or(self.config.default_rotation_interval_ms),
            campaigns,
            total_campaigns,
        })
    }
}
