//! Refresh scheduling with stale-result discard
//!
//! Every refresh takes a generation token when it starts. Only the result of
//! the newest generation may replace the displayed table; anything older is
//! dropped on arrival. A failed refresh keeps the previous table.


use crate::error::Result;
use crate::feed::SnapshotSource;
use crate::pipeline::{self, PipelineParams, WideTable};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Monotonic refresh identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Notification sent to subscribers after every current-generation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    Published(Generation),
    Failed(Generation),
}

impl RefreshEvent {
    pub fn generation(&self) -> Generation {
        match self {
            RefreshEvent::Published(g) | RefreshEvent::Failed(g) => *g,
        }
    }
}

/// Table currently shown to the presentation layer
#[derive(Debug, Clone)]
pub struct Displayed {
    pub generation: Generation,
    pub table: Arc<WideTable>,
    pub refreshed_at: DateTime<Utc>,
}

/// Most recent refresh failure
#[derive(Debug, Clone)]
pub struct RefreshFailure {
    pub generation: Generation,
    pub message: String,
    pub at: DateTime<Utc>,
}

pub struct RefreshController {
    generation: AtomicU64,
    params: RwLock<PipelineParams>,
    displayed: RwLock<Option<Displayed>>,
    last_error: RwLock<Option<RefreshFailure>>,
    updates: watch::Sender<Option<RefreshEvent>>,
}

impl RefreshController {
    pub fn new(params: PipelineParams) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            generation: AtomicU64::new(0),
            params: RwLock::new(params),
            displayed: RwLock::new(None),
            last_error: RwLock::new(None),
            updates,
        }
    }

    /// Start a refresh: new generation plus a snapshot of the parameters
    pub fn begin(&self) -> (Generation, PipelineParams) {
        let params = self.params.read().clone();
        let generation = Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        (generation, params)
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current_generation() == generation
    }

    /// Replace the parameters; refreshes already in flight become stale
    pub fn reconfigure(&self, params: PipelineParams) -> Generation {
        *self.params.write() = params;
        let generation = Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        debug!("Parameters changed, generation now {}", generation.0);
        generation
    }

    pub fn params(&self) -> PipelineParams {
        self.params.read().clone()
    }

    /// Store `table` if `generation` is still current. Returns false if discarded.
    pub fn publish(&self, generation: Generation, table: WideTable) -> bool {
        let mut displayed = self.displayed.write();
        if !self.is_current(generation) {
            debug!(
                "Discarding stale result of generation {} (current {})",
                generation.0,
                self.current_generation().0
            );
            return false;
        }
        if matches!(displayed.as_ref(), Some(d) if d.generation > generation) {
            return false;
        }

        *displayed = Some(Displayed {
            generation,
            table: Arc::new(table),
            refreshed_at: Utc::now(),
        });
        drop(displayed);

        *self.last_error.write() = None;
        self.updates.send_replace(Some(RefreshEvent::Published(generation)));
        true
    }

    /// Record a failure of a current refresh; the displayed table is kept
    pub fn fail(&self, generation: Generation, message: impl Into<String>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        *self.last_error.write() = Some(RefreshFailure {
            generation,
            message: message.into(),
            at: Utc::now(),
        });
        self.updates.send_replace(Some(RefreshEvent::Failed(generation)));
        true
    }

    pub fn displayed(&self) -> Option<Displayed> {
        self.displayed.read().clone()
    }

    pub fn last_error(&self) -> Option<RefreshFailure> {
        self.last_error.read().clone()
    }

    /// Notified of every published table and every recorded failure
    pub fn subscribe(&self) -> watch::Receiver<Option<RefreshEvent>> {
        self.updates.subscribe()
    }

    /// Run one refresh end to end. `Ok(false)` means the result went stale.
    pub async fn refresh_once(&self, source: &dyn SnapshotSource) -> Result<bool> {
        let (generation, params) = self.begin();
        match pipeline::run(source, &params).await {
            Ok(table) => {
                let rows = table.len();
                let published = self.publish(generation, table);
                if published {
                    info!("Generation {} published ({} rows)", generation.0, rows);
                }
                Ok(published)
            }
            Err(e) => {
                warn!("Refresh generation {} failed: {}", generation.0, e);
                self.fail(generation, e.to_string());
                Err(e)
            }
        }
    }

    /// Refresh every `interval` until `shutdown` turns true.
    ///
    /// Each tick runs in its own task, so a slow refresh may overlap the next
    /// one; the generation check settles which result is shown.
    pub async fn run_periodic(
        self: Arc<Self>,
        source: Arc<dyn SnapshotSource>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let controller = Arc::clone(&self);
                    let source = Arc::clone(&source);
                    tokio::spawn(async move {
                        // failures are recorded by refresh_once
                        let _ = controller.refresh_once(source.as_ref()).await;
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Periodic refresh stopped");
                        break;
                    }
                }
            }
        }
    }
}
