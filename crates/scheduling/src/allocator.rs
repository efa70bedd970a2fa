//! Slot allocator — decides whether a (spot, priority, date range)
//! reservation is free and reports conflicts with free-priority suggestions.
//!
//! Pure query over persisted campaign records; performs no writes. Callers
//! must re-run the check under the same per-spot lock as the eventual write.

use spotserve_core::config::SchedulingConfig;
use spotserve_core::types::{AdCampaign, AvailabilityQuery, AvailabilityResult, OverlappingCampaign};
use spotserve_core::{SpotServeError, SpotServeResult};
use tracing::debug;

/// A campaign considered by the allocator, paired with its client's display
/// name for the operator-facing conflict report.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub campaign: &'a AdCampaign,
    pub client_name: &'a str,
}

pub struct SlotAllocator {
    config: SchedulingConfig,
}

impl SlotAllocator {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    /// Check whether `query.priority` is free on the spot during
    /// `[start_date, end_date]`. `candidates` are the spot's campaigns;
    /// archived/completed ones and the excluded id are ignored.
    pub fn check_availability(
        &self,
        query: &AvailabilityQuery,
        candidates: &[Candidate<'_>],
    ) -> SpotServeResult<AvailabilityResult> {
        if query.start_date > query.end_date {
            return Err(SpotServeError::Validation(format!(
                "start_date {} is after end_date {}",
                query.start_date, query.end_date
            )));
        }
        if query.priority < 1 {
            return Err(SpotServeError::Validation(
                "priority must be a positive integer".to_string(),
            ));
        }

        let overlapping: Vec<&Candidate<'_>> = candidates
            .iter()
            .filter(|c| c.campaign.spot_id == query.spot_id)
            .filter(|c| c.campaign.status.holds_slot())
            .filter(|c| Some(c.campaign.id) != query.exclude_campaign_id)
            .filter(|c| c.campaign.overlaps(query.start_date, query.end_date))
            .collect();

        let mut taken_priorities: Vec<u32> =
            overlapping.iter().map(|c| c.campaign.priority).collect();
        taken_priorities.sort_unstable();
        taken_priorities.dedup();

        let available_priorities: Vec<u32> = (1..=self.config.priority_ceiling)
            .filter(|p| !taken_priorities.contains(p))
            .collect();

        let priority_taken = taken_priorities.contains(&query.priority);
        let max_campaigns_reached = overlapping.len() >= self.config.max_campaigns_per_spot;

        let overlapping_campaigns: Vec<OverlappingCampaign> = overlapping
            .iter()
            .map(|c| OverlappingCampaign {
                id: c.campaign.id,
                name: c.campaign.name.clone(),
                client_name: c.client_name.to_string(),
                start_date: c.campaign.start_date,
                end_date: c.campaign.end_date,
                priority: c.campaign.priority,
            })
            .collect();

        debug!(
            spot_id = query.spot_id,
            priority = query.priority,
            overlapping = overlapping_campaigns.len(),
            priority_taken,
            "availability checked"
        );

        Ok(AvailabilityResult {
            is_available: !priority_taken,
            priority_taken,
            taken_priorities,
            available_priorities,
            overlapping_campaigns,
            max_campaigns_reached,
        })
    }
}
