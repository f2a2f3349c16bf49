//! In-memory snapshot source for tests and offline runs

use super::SnapshotSource;
use crate::error::{Result, SpreadError};
use crate::types::{Asset, Exchange, Observation};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Mock source serving fixed batches per (exchange, asset)
pub struct MockSnapshotSource {
    data: RwLock<HashMap<(Exchange, Asset), Vec<Observation>>>,
    failing: RwLock<HashSet<Exchange>>,
    latency_ms: AtomicU64,
    calls: AtomicUsize,
}

impl Default for MockSnapshotSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSnapshotSource {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            latency_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_series(self, exchange: Exchange, asset: Asset, series: Vec<Observation>) -> Self {
        self.set_series(exchange, asset, series);
        self
    }

    /// Delay every fetch, e.g. to overlap refreshes
    pub fn with_latency(self, ms: u64) -> Self {
        self.set_latency(ms);
        self
    }

    pub fn set_series(&self, exchange: Exchange, asset: Asset, series: Vec<Observation>) {
        self.data.write().insert((exchange, asset), series);
    }

    pub fn set_latency(&self, ms: u64) {
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Make every fetch for `exchange` fail until `recover` is called
    pub fn fail_exchange(&self, exchange: Exchange) {
        self.failing.write().insert(exchange);
    }

    pub fn recover(&self, exchange: Exchange) {
        self.failing.write().remove(&exchange);
    }

    /// Number of fetches served so far (including failed ones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for MockSnapshotSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_day(
        &self,
        exchange: Exchange,
        asset: Asset,
        day: NaiveDate,
    ) -> Result<Vec<Observation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(latency)).await;
        }

        if self.failing.read().contains(&exchange) {
            return Err(SpreadError::Internal(format!(
                "simulated fetch failure for {}",
                exchange
            )));
        }

        self.data
            .read()
            .get(&(exchange, asset))
            .cloned()
            .ok_or_else(|| SpreadError::Fetch {
                status: 404,
                url: format!("mock://{}/{}/1min/{}.jsonl", exchange, asset, day),
            })
    }
}
