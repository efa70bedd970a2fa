//! In-memory campaign store backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store, using a
//! serializable transaction plus a unique constraint on (spot_id, priority,
//! date bucket) in place of the per-spot mutex. This provides the same API
//! surface for development and testing.

use crate::models::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use spotserve_core::config::SchedulingConfig;
use spotserve_core::event_sink::ExposureSink;
use spotserve_core::inventory::AdInventory;
use spotserve_core::types::*;
use spotserve_core::{SpotServeError, SpotServeResult};
use spotserve_scheduling::{Candidate, SlotAllocator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Thread-safe in-memory store for spots, clients, campaigns, and the
/// append-only view/click records.
pub struct CampaignStore {
    spots: DashMap<u64, AdSpot>,
    clients: DashMap<u64, Client>,
    campaigns: DashMap<u64, AdCampaign>,
    /// Append-only exposure timestamps keyed by campaign id. Duplicate
    /// inserts are accepted; dedup is the client's responsibility.
    views: DashMap<u64, Vec<DateTime<Utc>>>,
    clicks: DashMap<u64, Vec<DateTime<Utc>>>,
    /// Serializes check-then-act on campaign writes per spot.
    spot_write_locks: DashMap<u64, Arc<Mutex<()>>>,
    allocator: SlotAllocator,
    next_id: AtomicU64,
}

impl CampaignStore {
    pub fn new(config: SchedulingConfig) -> Self {
        info!("Campaign store initialized (in-memory, development mode)");
        Self {
            spots: DashMap::new(),
            clients: DashMap::new(),
            campaigns: DashMap::new(),
            views: DashMap::new(),
            clicks: DashMap::new(),
            spot_write_locks: DashMap::new(),
            allocator: SlotAllocator::new(config),
            next_id: AtomicU64::new(1),
        }
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn spot_lock(&self, spot_id: u64) -> Arc<Mutex<()>> {
        self.spot_write_locks
            .entry(spot_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // ─── Availability ──────────────────────────────────────────────────────

    /// Run the allocator against the spot's current campaigns. Pure read;
    /// campaign writes re-run this under the spot's write lock.
    pub fn check_availability(&self, query: &AvailabilityQuery) -> SpotServeResult<AvailabilityResult> {
        if !self.spots.contains_key(&query.spot_id) {
            return Err(SpotServeError::NotFound(format!("spot {}", query.spot_id)));
        }
        let named: Vec<(AdCampaign, String)> = self
            .campaigns
            .iter()
            .filter(|r| r.value().spot_id == query.spot_id)
            .map(|r| {
                let c = r.value().clone();
                let client_name = self
                    .clients
                    .get(&c.client_id)
                    .map(|cl| cl.name.clone())
                    .unwrap_or_default();
                (c, client_name)
            })
            .collect();
        let candidates: Vec<Candidate<'_>> = named
            .iter()
            .map(|(campaign, client_name)| Candidate { campaign, client_name })
            .collect();
        self.allocator.check_availability(query, &candidates)
    }

    /// Reject the write unless the slot is free and the spot has room.
    fn enforce_availability(&self, query: &AvailabilityQuery) -> SpotServeResult<()> {
        let result = self.check_availability(query)?;
        if !result.is_available || result.max_campaigns_reached {
            metrics::counter!("store.slot_conflicts").increment(1);
            return Err(SpotServeError::SlotConflict {
                spot_id: query.spot_id,
                priority: query.priority,
                availability: Box::new(result),
            });
        }
        Ok(())
    }

    // ─── Spots ─────────────────────────────────────────────────────────────

    pub fn list_spots(&self) -> Vec<AdSpot> {
        let mut spots: Vec<AdSpot> = self.spots.iter().map(|r| r.value().clone()).collect();
        spots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        spots
    }

    pub fn get_spot(&self, id: u64) -> Option<AdSpot> {
        self.spots.get(&id).map(|r| r.value().clone())
    }

    pub fn create_spot(&self, req: CreateSpotRequest) -> SpotServeResult<AdSpot> {
        let technical_id = req.technical_id.trim().to_string();
        if technical_id.is_empty() {
            return Err(SpotServeError::Validation(
                "technical_id must not be empty".to_string(),
            ));
        }
        if self
            .spots
            .iter()
            .any(|r| r.value().technical_id == technical_id)
        {
            return Err(SpotServeError::Validation(format!(
                "technical_id '{}' is already in use",
                technical_id
            )));
        }
        let now = Utc::now();
        let spot = AdSpot {
            id: self.alloc_id(),
            technical_id,
            name: req.name,
            dimensions: req.dimensions,
            rotation_interval_ms: req.rotation_interval_ms,
            max_slots: req.max_slots,
            active: req.active,
            created_at: now,
            updated_at: now,
        };
        self.spots.insert(spot.id, spot.clone());
        info!(spot_id = spot.id, technical_id = %spot.technical_id, "spot created");
        Ok(spot)
    }

    pub fn update_spot(&self, id: u64, req: UpdateSpotRequest) -> SpotServeResult<AdSpot> {
        let mut entry = self
            .spots
            .get_mut(&id)
            .ok_or_else(|| SpotServeError::NotFound(format!("spot {}", id)))?;
        let s = entry.value_mut();
        if let Some(name) = req.name { s.name = name; }
        if let Some(dimensions) = req.dimensions { s.dimensions = Some(dimensions); }
        if let Some(interval) = req.rotation_interval_ms { s.rotation_interval_ms = Some(interval); }
        if let Some(max_slots) = req.max_slots { s.max_slots = Some(max_slots); }
        if let Some(active) = req.active { s.active = active; }
        s.updated_at = Utc::now();
        Ok(s.clone())
    }

    /// Deletion is blocked while any non-archived campaign references the
    /// spot; the operator must archive them first.
    pub fn delete_spot(&self, id: u64) -> SpotServeResult<()> {
        if !self.spots.contains_key(&id) {
            return Err(SpotServeError::NotFound(format!("spot {}", id)));
        }
        let blocking: Vec<OverlappingCampaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().spot_id == id && r.value().status != CampaignStatus::Archived)
            .map(|r| {
                let c = r.value();
                OverlappingCampaign {
                    id: c.id,
                    name: c.name.clone(),
                    client_name: self
                        .clients
                        .get(&c.client_id)
                        .map(|cl| cl.name.clone())
                        .unwrap_or_default(),
                    start_date: c.start_date,
                    end_date: c.end_date,
                    priority: c.priority,
                }
            })
            .collect();
        if !blocking.is_empty() {
            return Err(SpotServeError::SpotInUse { spot_id: id, blocking });
        }
        self.spots.remove(&id);
        self.spot_write_locks.remove(&id);
        info!(spot_id = id, "spot deleted");
        Ok(())
    }

    // ─── Clients ───────────────────────────────────────────────────────────

    pub fn list_clients(&self) -> Vec<Client> {
        let mut clients: Vec<Client> = self.clients.iter().map(|r| r.value().clone()).collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        clients
    }

    pub fn get_client(&self, id: u64) -> Option<Client> {
        self.clients.get(&id).map(|r| r.value().clone())
    }

    pub fn create_client(&self, req: CreateClientRequest) -> SpotServeResult<Client> {
        if req.name.trim().is_empty() {
            return Err(SpotServeError::Validation(
                "client name must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let client = Client {
            id: self.alloc_id(),
            name: req.name,
            contact_email: req.contact_email,
            contact_phone: req.contact_phone,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.clients.insert(client.id, client.clone());
        info!(client_id = client.id, name = %client.name, "client created");
        Ok(client)
    }

    pub fn update_client(&self, id: u64, req: UpdateClientRequest) -> SpotServeResult<Client> {
        let mut entry = self
            .clients
            .get_mut(&id)
            .ok_or_else(|| SpotServeError::NotFound(format!("client {}", id)))?;
        let c = entry.value_mut();
        if let Some(name) = req.name { c.name = name; }
        if let Some(email) = req.contact_email { c.contact_email = Some(email); }
        if let Some(phone) = req.contact_phone { c.contact_phone = Some(phone); }
        if let Some(active) = req.active { c.active = active; }
        c.updated_at = Utc::now();
        Ok(c.clone())
    }

    pub fn delete_client(&self, id: u64) -> SpotServeResult<()> {
        if !self.clients.contains_key(&id) {
            return Err(SpotServeError::NotFound(format!("client {}", id)));
        }
        let campaign_count = self
            .campaigns
            .iter()
            .filter(|r| r.value().client_id == id)
            .count();
        if campaign_count > 0 {
            return Err(SpotServeError::ClientInUse {
                client_id: id,
                campaign_count,
            });
        }
        self.clients.remove(&id);
        info!(client_id = id, "client deleted");
        Ok(())
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn list_campaigns(&self) -> Vec<AdCampaign> {
        let mut campaigns: Vec<AdCampaign> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn get_campaign(&self, id: u64) -> Option<AdCampaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    pub fn create_campaign(&self, req: CreateCampaignRequest) -> SpotServeResult<AdCampaign> {
        validate_campaign_fields(&req.name, req.start_date, req.end_date, req.priority)?;
        validate_url("media_url", &req.media_url)?;
        if let Some(mobile) = &req.mobile_media_url {
            validate_url("mobile_media_url", mobile)?;
        }
        validate_url("destination_url", &req.destination_url)?;
        if !self.spots.contains_key(&req.spot_id) {
            return Err(SpotServeError::NotFound(format!("spot {}", req.spot_id)));
        }
        if !self.clients.contains_key(&req.client_id) {
            return Err(SpotServeError::NotFound(format!("client {}", req.client_id)));
        }

        // Check and insert atomically per spot; two concurrent creates for
        // the same priority must not both observe "available".
        let lock = self.spot_lock(req.spot_id);
        let _guard = lock.lock();

        self.enforce_availability(&AvailabilityQuery {
            spot_id: req.spot_id,
            start_date: req.start_date,
            end_date: req.end_date,
            priority: req.priority,
            exclude_campaign_id: None,
        })?;

        let now = Utc::now();
        let campaign = AdCampaign {
            id: self.alloc_id(),
            spot_id: req.spot_id,
            client_id: req.client_id,
            name: req.name,
            priority: req.priority,
            start_date: req.start_date,
            end_date: req.end_date,
            status: CampaignStatus::Draft,
            media_url: req.media_url,
            mobile_media_url: req.mobile_media_url,
            destination_url: req.destination_url,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        metrics::counter!("store.campaigns.created").increment(1);
        info!(
            campaign_id = campaign.id,
            spot_id = campaign.spot_id,
            priority = campaign.priority,
            "campaign created"
        );
        Ok(campaign)
    }

    pub fn update_campaign(&self, id: u64, req: UpdateCampaignRequest) -> SpotServeResult<AdCampaign> {
        // A campaign's spot never changes, so the spot id can be read before
        // taking the lock. Everything else is re-read under it so a status
        // transition landing in between is not overwritten.
        let spot_id = self
            .get_campaign(id)
            .ok_or_else(|| SpotServeError::NotFound(format!("campaign {}", id)))?
            .spot_id;

        let lock = self.spot_lock(spot_id);
        let _guard = lock.lock();

        let current = self
            .get_campaign(id)
            .ok_or_else(|| SpotServeError::NotFound(format!("campaign {}", id)))?;

        let mut updated = current.clone();
        if let Some(name) = req.name { updated.name = name; }
        if let Some(priority) = req.priority { updated.priority = priority; }
        if let Some(start) = req.start_date { updated.start_date = start; }
        if let Some(end) = req.end_date { updated.end_date = end; }
        if let Some(url) = req.media_url {
            validate_url("media_url", &url)?;
            updated.media_url = url;
        }
        if let Some(url) = req.mobile_media_url {
            validate_url("mobile_media_url", &url)?;
            updated.mobile_media_url = Some(url);
        }
        if let Some(url) = req.destination_url {
            validate_url("destination_url", &url)?;
            updated.destination_url = url;
        }
        validate_campaign_fields(&updated.name, updated.start_date, updated.end_date, updated.priority)?;

        if updated.status.holds_slot() {
            self.enforce_availability(&AvailabilityQuery {
                spot_id,
                start_date: updated.start_date,
                end_date: updated.end_date,
                priority: updated.priority,
                exclude_campaign_id: Some(id),
            })?;
        }

        // Write fields in place and leave status alone; set_status holds the
        // same entry lock, so a concurrent transition is never clobbered.
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| SpotServeError::NotFound(format!("campaign {}", id)))?;
        let c = entry.value_mut();
        c.name = updated.name;
        c.priority = updated.priority;
        c.start_date = updated.start_date;
        c.end_date = updated.end_date;
        c.media_url = updated.media_url;
        c.mobile_media_url = updated.mobile_media_url;
        c.destination_url = updated.destination_url;
        c.updated_at = Utc::now();
        let result = c.clone();
        drop(entry);
        info!(campaign_id = id, "campaign updated");
        Ok(result)
    }

    /// Deletion is allowed even with recorded views/clicks; stats are
    /// historical.
    pub fn delete_campaign(&self, id: u64) -> bool {
        let removed = self.campaigns.remove(&id).is_some();
        if removed {
            metrics::counter!("store.campaigns.deleted").increment(1);
            info!(campaign_id = id, "campaign deleted");
        }
        removed
    }

    // ─── Status transitions ────────────────────────────────────────────────

    /// Any transition into Active re-runs the allocator check.
    pub fn activate_campaign(&self, id: u64) -> SpotServeResult<AdCampaign> {
        let current = self
            .get_campaign(id)
            .ok_or_else(|| SpotServeError::NotFound(format!("campaign {}", id)))?;

        let lock = self.spot_lock(current.spot_id);
        let _guard = lock.lock();

        self.enforce_availability(&AvailabilityQuery {
            spot_id: current.spot_id,
            start_date: current.start_date,
            end_date: current.end_date,
            priority: current.priority,
            exclude_campaign_id: Some(id),
        })?;

        self.set_status(id, CampaignStatus::Active)
    }

    pub fn pause_campaign(&self, id: u64) -> SpotServeResult<AdCampaign> {
        if self.campaigns.get(&id).is_none() {
            return Err(SpotServeError::NotFound(format!("campaign {}", id)));
        }
        self.set_status(id, CampaignStatus::Paused)
    }

    pub fn complete_campaign(&self, id: u64) -> SpotServeResult<AdCampaign> {
        if self.campaigns.get(&id).is_none() {
            return Err(SpotServeError::NotFound(format!("campaign {}", id)));
        }
        self.set_status(id, CampaignStatus::Completed)
    }

    pub fn archive_campaign(&self, id: u64) -> SpotServeResult<AdCampaign> {
        if self.campaigns.get(&id).is_none() {
            return Err(SpotServeError::NotFound(format!("campaign {}", id)));
        }
        self.set_status(id, CampaignStatus::Archived)
    }

    fn set_status(&self, id: u64, status: CampaignStatus) -> SpotServeResult<AdCampaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| SpotServeError::NotFound(format!("campaign {}", id)))?;
        let c = entry.value_mut();
        c.status = status;
        c.updated_at = Utc::now();
        info!(campaign_id = id, status = ?status, "campaign status changed");
        Ok(c.clone())
    }

    // ─── Counters ──────────────────────────────────────────────────────────

    /// Append a view record. Idempotent in intent only; the caller's
    /// Exposure Tracker is the dedup layer.
    pub fn record_view(&self, campaign_id: u64) -> SpotServeResult<()> {
        if !self.campaigns.contains_key(&campaign_id) {
            return Err(SpotServeError::NotFound(format!("campaign {}", campaign_id)));
        }
        self.views.entry(campaign_id).or_default().push(Utc::now());
        metrics::counter!("store.views.recorded").increment(1);
        Ok(())
    }

    pub fn record_click(&self, campaign_id: u64) -> SpotServeResult<()> {
        if !self.campaigns.contains_key(&campaign_id) {
            return Err(SpotServeError::NotFound(format!("campaign {}", campaign_id)));
        }
        self.clicks.entry(campaign_id).or_default().push(Utc::now());
        metrics::counter!("store.clicks.recorded").increment(1);
        Ok(())
    }

    pub fn campaign_stats(&self, campaign_id: u64) -> SpotServeResult<CampaignStats> {
        if !self.campaigns.contains_key(&campaign_id) {
            return Err(SpotServeError::NotFound(format!("campaign {}", campaign_id)));
        }
        let views = self.views.get(&campaign_id).map(|v| v.len() as u64).unwrap_or(0);
        let clicks = self.clicks.get(&campaign_id).map(|v| v.len() as u64).unwrap_or(0);
        let ctr = if views > 0 {
            clicks as f64 / views as f64
        } else {
            0.0
        };
        Ok(CampaignStats {
            campaign_id,
            views,
            clicks,
            ctr,
        })
    }

    // ─── Demo data ─────────────────────────────────────────────────────────

    /// Seed a handful of spots, clients, and campaigns for development.
    pub fn seed_demo_data(&self) {
        use chrono::Duration;
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let today = Utc::now().date_naive();

        let clients: Vec<u64> = [
            ("Northwind Traders", "ads@northwind.example"),
            ("Contoso Music", "marketing@contoso.example"),
            ("Fabrikam Instruments", "hello@fabrikam.example"),
        ]
        .into_iter()
        .filter_map(|(name, email)| {
            self.create_client(CreateClientRequest {
                name: name.to_string(),
                contact_email: Some(email.to_string()),
                contact_phone: None,
            })
            .ok()
            .map(|c| c.id)
        })
        .collect();

        let spots = [
            ("header-banner", "Header Banner", 728u32, 90u32, 45_000u64),
            ("sidebar-square", "Sidebar Square", 300, 250, 30_000),
            ("footer-strip", "Footer Strip", 970, 90, 60_000),
        ];
        for (i, (technical_id, name, w, h, interval)) in spots.into_iter().enumerate() {
            let spot = match self.create_spot(CreateSpotRequest {
                technical_id: technical_id.to_string(),
                name: name.to_string(),
                dimensions: Some(Dimensions { width: w, height: h }),
                rotation_interval_ms: Some(interval),
                max_slots: Some(5),
                active: true,
            }) {
                Ok(spot) => spot,
                Err(e) => {
                    warn!(error = %e, technical_id, "demo spot skipped");
                    continue;
                }
            };

            for priority in 1..=2u32 {
                let client_id = clients[(i + priority as usize) % clients.len()];
                let jitter = rng.gen_range(0..14);
                let req = CreateCampaignRequest {
                    spot_id: spot.id,
                    client_id,
                    name: format!("{} — slot {}", name, priority),
                    priority,
                    start_date: today - Duration::days(7 + jitter),
                    end_date: today + Duration::days(21 + jitter),
                    media_url: format!("https://cdn.spotserve.example/{}/{}.png", technical_id, priority),
                    mobile_media_url: None,
                    destination_url: "https://example.com/offers".to_string(),
                };
                match self.create_campaign(req) {
                    Ok(c) => {
                        if let Err(e) = self.activate_campaign(c.id) {
                            warn!(error = %e, campaign_id = c.id, "demo campaign not activated");
                        }
                    }
                    Err(e) => warn!(error = %e, "demo campaign skipped"),
                }
            }
        }
        info!("demo data seeded");
    }
}

impl AdInventory for CampaignStore {
    fn spot_by_technical_id(&self, technical_id: &str) -> Option<AdSpot> {
        self.spots
            .iter()
            .find(|r| r.value().technical_id == technical_id)
            .map(|r| r.value().clone())
    }

    fn campaigns_for_spot(&self, spot_id: u64) -> Vec<AdCampaign> {
        self.campaigns
            .iter()
            .filter(|r| r.value().spot_id == spot_id)
            .map(|r| r.value().clone())
            .collect()
    }

    fn client_name(&self, client_id: u64) -> Option<String> {
        self.clients.get(&client_id).map(|c| c.name.clone())
    }
}

// ─── Exposure sink ─────────────────────────────────────────────────────────

/// Sink that forwards accepted exposure events straight into the store's
/// counters. The HTTP deployment uses the track endpoints instead.
pub struct StoreExposureSink {
    store: Arc<CampaignStore>,
}

impl StoreExposureSink {
    pub fn new(store: Arc<CampaignStore>) -> Self {
        Self { store }
    }
}

impl ExposureSink for StoreExposureSink {
    fn deliver(&self, event: ExposureEvent) -> SpotServeResult<()> {
        match event.event_type {
            ExposureType::View => self.store.record_view(event.campaign_id),
            ExposureType::Click => self.store.record_click(event.campaign_id),
        }
    }
}

// ─── Validation ────────────────────────────────────────────────────────────

fn validate_campaign_fields(
    name: &str,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    priority: u32,
) -> SpotServeResult<()> {
    if name.trim().is_empty() {
        return Err(SpotServeError::Validation(
            "campaign name must not be empty".to_string(),
        ));
    }
    if start_date > end_date {
        return Err(SpotServeError::Validation(format!(
            "start_date {} is after end_date {}",
            start_date, end_date
        )));
    }
    if priority < 1 {
        return Err(SpotServeError::Validation(
            "priority must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

fn validate_url(field: &str, value: &str) -> SpotServeResult<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| SpotServeError::Validation(format!("{} is not a valid URL: {}", field, e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn store() -> CampaignStore {
        CampaignStore::new(SchedulingConfig::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_spot_and_client(store: &CampaignStore) -> (u64, u64) {
        let spot = store
            .create_spot(CreateSpotRequest {
                technical_id: "header-banner".into(),
                name: "Header Banner".into(),
                dimensions: Some(Dimensions { width: 728, height: 90 }),
                rotation_interval_ms: Some(45_000),
                max_slots: Some(5),
                active: true,
            })
            .unwrap();
        let client = store
            .create_client(CreateClientRequest {
                name: "Northwind Traders".into(),
                contact_email: None,
                contact_phone: None,
            })
            .unwrap();
        (spot.id, client.id)
    }

    fn campaign_request(spot_id: u64, client_id: u64, priority: u32, start: NaiveDate, end: NaiveDate) -> CreateCampaignRequest {
        CreateCampaignRequest {
            spot_id,
            client_id,
            name: format!("p{} campaign", priority),
            priority,
            start_date: start,
            end_date: end,
            media_url: "https://cdn.example.com/banner.png".into(),
            mobile_media_url: None,
            destination_url: "https://example.com".into(),
        }
    }

    #[test]
    fn test_create_campaign_starts_draft() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let c = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();
        assert_eq!(c.status, CampaignStatus::Draft);
        assert_eq!(c.priority, 1);
    }

    #[test]
    fn test_create_conflict_carries_availability() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let existing = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 15), date(2025, 7, 15)))
            .unwrap();
        store.activate_campaign(existing.id).unwrap();

        let err = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap_err();
        match err {
            SpotServeError::SlotConflict { availability, .. } => {
                assert!(availability.priority_taken);
                assert_eq!(availability.overlapping_campaigns.len(), 1);
                assert_eq!(availability.overlapping_campaigns[0].id, existing.id);
                assert_eq!(availability.overlapping_campaigns[0].client_name, "Northwind Traders");
            }
            other => panic!("expected SlotConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_update_self_exclusion() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let c = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();

        // Same priority, same interval: must not conflict with itself.
        let updated = store
            .update_campaign(
                c.id,
                UpdateCampaignRequest {
                    name: Some("renamed".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.priority, 1);
    }

    #[test]
    fn test_update_into_taken_priority_conflicts() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let _p1 = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();
        let p2 = store
            .create_campaign(campaign_request(spot_id, client_id, 2, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();

        let err = store
            .update_campaign(
                p2.id,
                UpdateCampaignRequest {
                    priority: Some(1),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SpotServeError::SlotConflict { .. }));
    }

    #[test]
    fn test_activate_rechecks_allocator() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        // Archiving releases the slot; re-activation must re-check it.
        let a = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();
        store.archive_campaign(a.id).unwrap();
        let b = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();
        store.activate_campaign(b.id).unwrap();

        let err = store.activate_campaign(a.id).unwrap_err();
        match err {
            SpotServeError::SlotConflict { availability, .. } => {
                assert_eq!(availability.overlapping_campaigns[0].id, b.id);
            }
            other => panic!("expected SlotConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_spot_delete_blocked_then_allowed() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let c = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();

        let err = store.delete_spot(spot_id).unwrap_err();
        match err {
            SpotServeError::SpotInUse { blocking, .. } => {
                assert_eq!(blocking.len(), 1);
                assert_eq!(blocking[0].id, c.id);
            }
            other => panic!("expected SpotInUse, got {:?}", other),
        }

        store.archive_campaign(c.id).unwrap();
        store.delete_spot(spot_id).unwrap();
        assert!(store.get_spot(spot_id).is_none());
    }

    #[test]
    fn test_client_delete_blocked_while_referenced() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let c = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();

        assert!(matches!(
            store.delete_client(client_id).unwrap_err(),
            SpotServeError::ClientInUse { campaign_count: 1, .. }
        ));
        assert!(store.delete_campaign(c.id));
        store.delete_client(client_id).unwrap();
    }

    #[test]
    fn test_campaign_delete_allowed_with_stats() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let c = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();
        store.record_view(c.id).unwrap();
        store.record_click(c.id).unwrap();
        assert!(store.delete_campaign(c.id));
    }

    #[test]
    fn test_counters_accept_duplicates() {
        // The store is deliberately not the dedup layer.
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let c = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();
        store.record_view(c.id).unwrap();
        store.record_view(c.id).unwrap();
        store.record_click(c.id).unwrap();

        let stats = store.campaign_stats(c.id).unwrap();
        assert_eq!(stats.views, 2);
        assert_eq!(stats.clicks, 1);
        assert!((stats.ctr - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_view_unknown_campaign() {
        let store = store();
        assert!(matches!(
            store.record_view(999).unwrap_err(),
            SpotServeError::NotFound(_)
        ));
    }

    #[test]
    fn test_duplicate_technical_id_rejected() {
        let store = store();
        seed_spot_and_client(&store);
        let err = store
            .create_spot(CreateSpotRequest {
                technical_id: "header-banner".into(),
                name: "Duplicate".into(),
                dimensions: None,
                rotation_interval_ms: None,
                max_slots: None,
                active: true,
            })
            .unwrap_err();
        assert!(matches!(err, SpotServeError::Validation(_)));
    }

    #[test]
    fn test_invalid_media_url_rejected() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let mut req = campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30));
        req.media_url = "not a url".into();
        assert!(matches!(
            store.create_campaign(req).unwrap_err(),
            SpotServeError::Validation(_)
        ));
    }

    #[test]
    fn test_concurrent_creates_one_wins() {
        let store = Arc::new(store());
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let start = date(2025, 6, 1);
        let end = date(2025, 6, 30);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.create_campaign(campaign_request(spot_id, client_id, 1, start, end))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(SpotServeError::SlotConflict { .. })))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }

    #[test]
    fn test_update_never_overwrites_concurrent_transition() {
        let store = Arc::new(store());
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let c = store
            .create_campaign(campaign_request(spot_id, client_id, 1, date(2025, 6, 1), date(2025, 6, 30)))
            .unwrap();
        store.activate_campaign(c.id).unwrap();

        let updater = {
            let store = store.clone();
            let id = c.id;
            std::thread::spawn(move || {
                for i in 0..200 {
                    store
                        .update_campaign(
                            id,
                            UpdateCampaignRequest {
                                name: Some(format!("rename {}", i)),
                                ..Default::default()
                            },
                        )
                        .unwrap();
                }
            })
        };
        // Archive mid-flight; field updates must not resurrect Active.
        store.archive_campaign(c.id).unwrap();
        updater.join().unwrap();

        let after = store.get_campaign(c.id).unwrap();
        assert_eq!(after.status, CampaignStatus::Archived);
        assert_eq!(after.name, "rename 199");
    }

    #[test]
    fn test_seed_demo_data_is_consistent() {
        let store = store();
        store.seed_demo_data();
        assert_eq!(store.list_spots().len(), 3);
        assert!(store.list_campaigns().len() >= 6);
        // Every seeded campaign must satisfy the slot invariant; re-checking
        // each against its own reservation reports available.
        for c in store.list_campaigns() {
            let result = store
                .check_availability(&AvailabilityQuery {
                    spot_id: c.spot_id,
                    start_date: c.start_date,
                    end_date: c.end_date,
                    priority: c.priority,
                    exclude_campaign_id: Some(c.id),
                })
                .unwrap();
            assert!(result.is_available, "campaign {} violates slot invariant", c.id);
        }
    }

    #[test]
    fn test_eligibility_window() {
        let store = store();
        let (spot_id, client_id) = seed_spot_and_client(&store);
        let today = Utc::now().date_naive();
        let c = store
            .create_campaign(campaign_request(
                spot_id,
                client_id,
                1,
                today - Duration::days(1),
                today + Duration::days(1),
            ))
            .unwrap();
        let c = store.activate_campaign(c.id).unwrap();
        assert!(c.is_eligible_on(today));
        assert!(!c.is_eligible_on(today + Duration::days(2)));
    }
}
