//! Ad delivery — spot resolution, client-side rotation, and session-scoped
//! exposure tracking.

pub mod exposure;
pub mod resolver;
pub mod rotation;

pub use exposure::{ExposureTracker, SessionStore};
pub use resolver::SpotResolver;
pub use rotation::{PlacementHandle, PlacementState, RotationEngine};
