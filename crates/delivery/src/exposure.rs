//! Exposure tracker — at most one view and one click per campaign per
//! viewer session.
//!
//! The session store is injected at construction (the browser original kept
//! these sets in local storage; here they are an explicit value). Dedup is
//! best-effort and session-scoped: a cleared session may recount the same
//! viewer, which is an accepted tolerance.

use parking_lot::Mutex;
use spotserve_core::event_sink::{make_exposure, ExposureSink};
use spotserve_core::types::ExposureType;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// The viewer's session-scoped dedup state: which campaigns have already
/// reported a view or a click.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    pub session_id: Uuid,
    pub viewed: HashSet<u64>,
    pub clicked: HashSet<u64>,
}

impl SessionStore {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            viewed: HashSet::new(),
            clicked: HashSet::new(),
        }
    }
}

pub struct ExposureTracker {
    session: Mutex<SessionStore>,
    sink: Arc<dyn ExposureSink>,
}

impl ExposureTracker {
    pub fn new(session: SessionStore, sink: Arc<dyn ExposureSink>) -> Self {
        Self {
            session: Mutex::new(session),
            sink,
        }
    }

    /// Record a view; call when the ad's media has successfully rendered,
    /// not merely been requested. Returns true if the event was accepted
    /// (first time this session), false if deduplicated.
    pub fn record_view(&self, campaign_id: u64) -> bool {
        self.record(campaign_id, ExposureType::View)
    }

    /// Record a click on the ad's destination link, before navigation.
    pub fn record_click(&self, campaign_id: u64) -> bool {
        self.record(campaign_id, ExposureType::Click)
    }

    fn record(&self, campaign_id: u64, event_type: ExposureType) -> bool {
        let session_id = {
            // Membership check and insert under one lock so two
            // near-simultaneous "loaded" events stay idempotent.
            let mut session = self.session.lock();
            let set = match event_type {
                ExposureType::View => &mut session.viewed,
                ExposureType::Click => &mut session.clicked,
            };
            if !set.insert(campaign_id) {
                debug!(campaign_id, ?event_type, "exposure deduplicated");
                return false;
            }
            session.session_id
        };

        // Forwarding failure is logged and swallowed; it must never block
        // rendering or rotation.
        if let Err(e) = self
            .sink
            .deliver(make_exposure(event_type, campaign_id, session_id))
        {
            warn!(error = %e, campaign_id, ?event_type, "exposure delivery failed");
        } else {
            metrics::counter!("delivery.exposures.forwarded").increment(1);
        }
        true
    }

    /// Snapshot of the session state, e.g. for persisting across reloads.
    pub fn session(&self) -> SessionStore {
        self.session.lock().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use spotserve_core::event_sink::{capture_sink, noop_sink, CaptureSink};
    use spotserve_core::types::ExposureEvent;
    use spotserve_core::{SpotServeError, SpotServeResult};

    fn tracker(sink: Arc<CaptureSink>) -> ExposureTracker {
        ExposureTracker::new(SessionStore::new(Uuid::new_v4()), sink)
    }

    #[test]
    fn test_view_forwarded_exactly_once() {
        let sink = capture_sink();
        let tracker = tracker(sink.clone());

        assert!(tracker.record_view(42));
        assert!(!tracker.record_view(42));
        assert!(!tracker.record_view(42));

        assert_eq!(sink.count(), 1);
        assert_eq!(sink.count_type(ExposureType::View), 1);
        assert_eq!(sink.events()[0].campaign_id, 42);
    }

    #[test]
    fn test_view_and_click_guards_independent() {
        let sink = capture_sink();
        let tracker = tracker(sink.clone());

        assert!(tracker.record_view(42));
        assert!(tracker.record_click(42));
        assert!(!tracker.record_view(42));
        assert!(!tracker.record_click(42));

        assert_eq!(sink.count_type(ExposureType::View), 1);
        assert_eq!(sink.count_type(ExposureType::Click), 1);
    }

    #[test]
    fn test_distinct_campaigns_each_count() {
        let sink = capture_sink();
        let tracker = tracker(sink.clone());

        assert!(tracker.record_view(1));
        assert!(tracker.record_view(2));
        assert!(tracker.record_view(3));
        assert_eq!(sink.count(), 3);
    }

    #[test]
    fn test_new_session_recounts() {
        let sink = capture_sink();
        let first = ExposureTracker::new(SessionStore::new(Uuid::new_v4()), sink.clone());
        assert!(first.record_view(7));

        // A fresh session (cleared local state) legitimately counts again.
        let second = ExposureTracker::new(SessionStore::new(Uuid::new_v4()), sink.clone());
        assert!(second.record_view(7));

        assert_eq!(sink.count_type(ExposureType::View), 2);
    }

    #[test]
    fn test_preloaded_session_suppresses() {
        let sink = capture_sink();
        let mut session = SessionStore::new(Uuid::new_v4());
        session.viewed.insert(42);
        let tracker = ExposureTracker::new(session, sink.clone());

        assert!(!tracker.record_view(42));
        assert_eq!(sink.count(), 0);
    }

    struct FailingSink;

    impl ExposureSink for FailingSink {
        fn deliver(&self, _event: ExposureEvent) -> SpotServeResult<()> {
            Err(SpotServeError::Transient("connection refused".into()))
        }
    }

    #[test]
    fn test_delivery_failure_swallowed() {
        let tracker = ExposureTracker::new(SessionStore::new(Uuid::new_v4()), Arc::new(FailingSink));
        // Accepted locally even though forwarding failed; no retry.
        assert!(tracker.record_view(42));
        assert!(!tracker.record_view(42));
    }

    #[test]
    fn test_concurrent_loaded_events_idempotent() {
        let sink = capture_sink();
        let tracker = Arc::new(ExposureTracker::new(
            SessionStore::new(Uuid::new_v4()),
            sink.clone() as Arc<dyn ExposureSink>,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || tracker.record_view(42))
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|accepted| *accepted)
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_noop_sink_still_dedups() {
        let tracker = ExposureTracker::new(SessionStore::new(Uuid::new_v4()), noop_sink());
        assert!(tracker.record_view(1));
        assert!(!tracker.record_view(1));
    }
}
