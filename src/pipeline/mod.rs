//! Refresh pipeline
//!
//! fetch (concurrent, all-or-nothing) -> resample -> align -> smooth -> wide table


use crate::config::DashboardConfig;
use crate::error::{Result, SpreadError};
use crate::feed::SnapshotSource;
use crate::naming;
use crate::series::{align, column_series, resample, smooth};
use crate::types::{Asset, Exchange, Field, MaKind, Observation, Point, Row, Timeframe};
use chrono::NaiveDate;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Everything a refresh depends on, passed explicitly
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    pub asset: Asset,
    pub exchanges: Vec<Exchange>,
    /// Metric columns to smooth
    pub columns: Vec<Field>,
    pub windows: Vec<usize>,
    pub kinds: Vec<MaKind>,
    pub timeframe: Timeframe,
    /// UTC day of the snapshot files
    pub day: NaiveDate,
}

impl PipelineParams {
    pub fn from_config(config: &DashboardConfig, day: NaiveDate) -> Self {
        Self {
            asset: config.asset,
            exchanges: config.exchanges.clone(),
            columns: config.levels.clone(),
            windows: config.windows.clone(),
            kinds: config.kinds.clone(),
            timeframe: config.timeframe,
            day,
        }
    }

    /// Reject selections that cannot produce a table
    pub fn validate(&self) -> Result<()> {
        if self.exchanges.is_empty() {
            return Err(SpreadError::InvalidParameter(
                "at least one exchange must be selected".to_string(),
            ));
        }
        if let Some(w) = self.windows.iter().find(|w| **w == 0) {
            return Err(SpreadError::InvalidParameter(format!(
                "moving-average window must be positive, got {}",
                w
            )));
        }
        Ok(())
    }

    /// Selected exchanges, de-duplicated, in selection order
    pub fn distinct_exchanges(&self) -> Vec<Exchange> {
        dedup(&self.exchanges)
    }

    pub fn is_multi_source(&self) -> bool {
        self.distinct_exchanges().len() > 1
    }
}

fn dedup<T: PartialEq + Copy>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for &item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Legend entry for one attached smoothed series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesLabel {
    pub data_key: String,
    pub label: String,
}

/// Rows keyed by timestamp plus the smoothed series attached to them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    pub rows: Vec<Row>,
    pub series: Vec<SeriesLabel>,
}

impl WideTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One column as a (timestamp, value) series
    pub fn column(&self, key: &str) -> Vec<Point> {
        column_series(&self.rows, key)
    }
}

/// Fetch every selected exchange concurrently; the first failure fails all
pub async fn fetch_sources(
    source: &dyn SnapshotSource,
    params: &PipelineParams,
) -> Result<BTreeMap<Exchange, Vec<Observation>>> {
    let exchanges = params.distinct_exchanges();
    let fetches = exchanges
        .iter()
        .map(|&exchange| source.fetch_day(exchange, params.asset, params.day));
    let batches = try_join_all(fetches).await?;

    Ok(exchanges
        .into_iter()
        .zip(batches)
        .inspect(|(exchange, batch)| {
            debug!("{} {} returned {} snapshots", exchange, params.asset, batch.len())
        })
        .collect())
}

/// Build the wide table from already-fetched batches
pub fn build_table(
    sources: BTreeMap<Exchange, Vec<Observation>>,
    params: &PipelineParams,
) -> WideTable {
    let multi_source = sources.len() > 1;
    let minutes = params.timeframe.minutes();

    let resampled: BTreeMap<Exchange, Vec<Observation>> = sources
        .into_iter()
        .map(|(exchange, batch)| (exchange, resample(batch, minutes)))
        .collect();

    let mut rows = align(&resampled, &Field::ALL);
    let mut series = Vec::new();

    let columns = dedup(&params.columns);
    let windows = dedup(&params.windows);
    let kinds = dedup(&params.kinds);

    for exchange in params.distinct_exchanges() {
        if !resampled.contains_key(&exchange) {
            continue;
        }
        for &column in &columns {
            let input = column_series(&rows, &naming::base_column(exchange, column, multi_source));
            for &window in &windows {
                for &kind in &kinds {
                    let tag = naming::series_tag(exchange, column, kind, window);
                    let smoothed = smooth(kind, &input, window);
                    for (row, point) in rows.iter_mut().zip(smoothed) {
                        row.insert(tag.clone(), point.v);
                    }
                    series.push(SeriesLabel {
                        label: naming::series_label(exchange, column, kind, window, multi_source),
                        data_key: tag,
                    });
                }
            }
        }
    }

    WideTable { rows, series }
}

/// Run one full refresh for `params`
pub async fn run(source: &dyn SnapshotSource, params: &PipelineParams) -> Result<WideTable> {
    params.validate()?;
    info!(
        "Refreshing {} {} from {} ({} exchange(s), {})",
        params.asset,
        params.day,
        source.name(),
        params.distinct_exchanges().len(),
        params.timeframe
    );

    let sources = fetch_sources(source, params).await?;
    let table = build_table(sources, params);

    info!(
        "Built table with {} rows and {} smoothed series",
        table.len(),
        table.series.len()
    );
    Ok(table)
}
