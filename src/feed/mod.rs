//! Snapshot retrieval
//!
//! One newline-delimited JSON file per (exchange, asset, UTC day), each line a
//! one-minute order-book snapshot. Sources:
//! - HTTP object store (production)
//! - In-memory mock (tests, dry runs)

mod http;
pub mod mock;
#[cfg(test)]
mod tests;

pub use http::HttpSnapshotSource;
pub use mock::MockSnapshotSource;

use crate::error::{Result, SpreadError};
use crate::types::{Asset, Exchange, Field, Observation};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::warn;

/// Provider of daily snapshot batches
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Fetch and normalize all snapshots of one day, in file order
    async fn fetch_day(
        &self,
        exchange: Exchange,
        asset: Asset,
        day: NaiveDate,
    ) -> Result<Vec<Observation>>;
}

/// Current UTC calendar day
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Object path of one daily file, e.g. `{base}/coinbase/BTC/1min/2025-01-01.jsonl`
pub fn snapshot_url(base_url: &str, exchange: Exchange, asset: Asset, day: NaiveDate) -> String {
    format!(
        "{}/{}/{}/1min/{}.jsonl",
        base_url.trim_end_matches('/'),
        exchange.id(),
        asset.symbol(),
        day.format("%Y-%m-%d")
    )
}

/// Parse an NDJSON body into observations.
///
/// Blank lines are skipped. A line that is not JSON fails the whole batch;
/// a JSON value that is not a usable record is dropped.
pub fn parse_ndjson(body: &str) -> Result<Vec<Observation>> {
    let mut out = Vec::new();
    let mut dropped = 0usize;

    for (idx, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|source| SpreadError::Parse {
            line: idx + 1,
            source,
        })?;
        match normalize_record(&value) {
            Some(obs) => out.push(obs),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("Dropped {} snapshot records without a timestamp", dropped);
    }

    Ok(out)
}

/// Keep the timestamp and the fixed numeric fields of a raw record.
///
/// Anything that is not a finite JSON number becomes absent.
pub fn normalize_record(value: &Value) -> Option<Observation> {
    let record = value.as_object()?;
    let t = record.get("t")?.as_str()?;
    if t.is_empty() {
        return None;
    }

    let mut obs = Observation::new(t);
    for field in Field::ALL {
        obs.set(field, record.get(field.record_name()).and_then(Value::as_f64));
    }
    Some(obs)
}
