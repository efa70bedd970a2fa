//! Campaign management — validated CRUD for spots, clients, and campaigns,
//! append-only view/click counters, and the operator-facing REST surface.

pub mod handlers;
pub mod models;
pub mod router;
pub mod store;

pub use store::{CampaignStore, StoreExposureSink};
