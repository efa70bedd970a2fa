pub mod config;
pub mod error;
pub mod event_sink;
pub mod inventory;
pub mod types;

pub use config::AppConfig;
pub use error::{SpotServeError, SpotServeResult};
