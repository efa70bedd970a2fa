//! Exposure event sink — trait for forwarding accepted view/click events
//! from the Exposure Tracker to the campaign counters.
//!
//! The tracker accepts an `Arc<dyn ExposureSink>` so dedup logic stays free
//! of hidden globals and unit-testable in isolation.

use crate::error::SpotServeResult;
use crate::types::{ExposureEvent, ExposureType};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Trait for delivering exposure events. Implementations route events to
/// the campaign store's counters (in process or over HTTP).
pub trait ExposureSink: Send + Sync {
    fn deliver(&self, event: ExposureEvent) -> SpotServeResult<()>;
}

/// No-op sink for tests and placements that don't report exposure.
pub struct NoOpSink;

impl ExposureSink for NoOpSink {
    fn deliver(&self, _event: ExposureEvent) -> SpotServeResult<()> {
        Ok(())
    }
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<ExposureEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ExposureEvent> {
        self.events.lock().expect("exposure sink mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("exposure sink mutex poisoned").len()
    }

    pub fn count_type(&self, event_type: ExposureType) -> usize {
        self.events
            .lock()
            .expect("exposure sink mutex poisoned")
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("exposure sink mutex poisoned").clear();
    }
}

impl ExposureSink for CaptureSink {
    fn deliver(&self, event: ExposureEvent) -> SpotServeResult<()> {
        self.events.lock().expect("exposure sink mutex poisoned").push(event);
        Ok(())
    }
}

/// Convenience builder for creating an `ExposureEvent`.
pub fn make_exposure(event_type: ExposureType, campaign_id: u64, session_id: Uuid) -> ExposureEvent {
    ExposureEvent {
        event_id: Uuid::new_v4(),
        event_type,
        campaign_id,
        session_id,
        timestamp: Utc::now(),
    }
}

/// Convenience: create a no-op sink.
pub fn noop_sink() -> Arc<dyn ExposureSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
