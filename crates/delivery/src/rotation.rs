//! Rotation engine — per-placement state machine that cycles through the
//! served campaigns on a timer and on navigation events.
//!
//! The synchronous core (`load`/`tick`/`navigate`) owns all rotation state;
//! the tokio driver multiplexes the two event sources into the same
//! `advance` action. One engine instance per rendered placement, never
//! shared across placements.

use parking_lot::Mutex;
use spotserve_core::types::{AdResponse, ServedCampaign};
use spotserve_core::{SpotServeError, SpotServeResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementState {
    /// Waiting for the single spot-resolver fetch.
    Loading,
    /// Spot exists but nothing is eligible; render a neutral empty state.
    Idle,
    /// Cycling through `campaigns[index]`.
    Rotating { index: usize },
    /// Load failed (NotFound or transient); no automatic retry, the page
    /// must remount the placement.
    Unavailable,
    Destroyed,
}

pub struct RotationEngine {
    state: PlacementState,
    campaigns: Vec<ServedCampaign>,
    rotation_interval_ms: u64,
    /// Whether the currently selected ad has already reported its view.
    view_reported: bool,
}

impl Default for RotationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationEngine {
    pub fn new() -> Self {
        Self {
            state: PlacementState::Loading,
            campaigns: Vec::new(),
            rotation_interval_ms: 0,
            view_reported: false,
        }
    }

    /// Feed the result of the one-time spot-resolver fetch.
    pub fn load(&mut self, response: SpotServeResult<AdResponse>) {
        if self.state != PlacementState::Loading {
            return;
        }
        match response {
            Ok(response) => {
                self.rotation_interval_ms = response.rotation_interval_ms;
                self.campaigns = response.campaigns;
                self.state = if self.campaigns.is_empty() {
                    PlacementState::Idle
                } else {
                    PlacementState::Rotating { index: 0 }
                };
                debug!(
                    campaigns = self.campaigns.len(),
                    interval_ms = self.rotation_interval_ms,
                    "placement loaded"
                );
            }
            Err(e) => {
                match e {
                    SpotServeError::NotFound(_) | SpotServeError::Transient(_) => {
                        warn!(error = %e, "ad load failed, placement unavailable")
                    }
                    other => warn!(error = %other, "unexpected ad load failure"),
                }
                self.state = PlacementState::Unavailable;
            }
        }
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    pub fn current_ad(&self) -> Option<&ServedCampaign> {
        match self.state {
            PlacementState::Rotating { index } => self.campaigns.get(index),
            _ => None,
        }
    }

    /// Server-provided interval; the client never substitutes its own.
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    /// The timer is only armed while there is something to rotate between.
    pub fn timer_armed(&self) -> bool {
        matches!(self.state, PlacementState::Rotating { .. }) && self.campaigns.len() > 1
    }

    /// Timer fired.
    pub fn tick(&mut self) {
        if self.timer_armed() {
            self.advance();
        }
    }

    /// External "content navigated" signal; advances without waiting for
    /// the timer.
    pub fn navigate(&mut self) {
        if matches!(self.state, PlacementState::Rotating { .. }) {
            self.advance();
        }
    }

    /// Single advance action shared by both triggers. Selects the next
    /// campaign cyclically and resets the view-reported flag for it.
    fn advance(&mut self) {
        if let PlacementState::Rotating { index } = self.state {
            let next = (index + 1) % self.campaigns.len();
            self.state = PlacementState::Rotating { index: next };
            self.view_reported = false;
            metrics::counter!("delivery.rotations").increment(1);
        }
    }

    /// Record that the current ad's view has been reported; returns false
    /// if it already was.
    pub fn mark_view_reported(&mut self) -> bool {
        if self.view_reported {
            return false;
        }
        self.view_reported = true;
        true
    }

    pub fn destroy(&mut self) {
        self.state = PlacementState::Destroyed;
        self.campaigns.clear();
    }
}

// ─── Async driver ──────────────────────────────────────────────────────────

/// Handle to a running placement loop. Call [`shutdown`](Self::shutdown) on
/// unmount; the engine is marked Destroyed and the timer task exits.
pub struct PlacementHandle {
    navigate_tx: mpsc::Sender<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PlacementHandle {
    /// Spawn the timer/navigation loop for a loaded engine. The engine must
    /// already have been fed its `load` result.
    pub fn spawn(engine: Arc<Mutex<RotationEngine>>) -> Self {
        let (navigate_tx, mut navigate_rx) = mpsc::channel::<()>(8);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let interval = {
            let engine = engine.lock();
            engine.rotation_interval().max(Duration::from_millis(1))
        };

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first interval tick fires immediately; consume it so the
            // first rotation happens one full interval after mount.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.lock().tick();
                    }
                    received = navigate_rx.recv() => {
                        match received {
                            Some(()) => engine.lock().navigate(),
                            None => break,
                        }
                    }
                    _ = &mut shutdown_rx => {
                        engine.lock().destroy();
                        break;
                    }
                }
            }
            debug!("placement loop stopped");
        });

        Self {
            navigate_tx,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// Signal a navigation event (page route change).
    pub fn navigate(&self) {
        // A full queue means rotations are already pending; dropping the
        // signal is harmless.
        let _ = self.navigate_tx.try_send(());
    }

    /// Cancel the timer and destroy the engine.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}
