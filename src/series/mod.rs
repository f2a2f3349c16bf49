//! Time-series core
//!
//! Pure functions over bounded daily batches:
//! - Alignment of several sources by timestamp (outer join)
//! - Resampling of one-minute data into wall-clock buckets
//! - Trailing simple / exponential moving averages
//!
//! Absent values flow through every stage; nothing here returns an error.

pub mod align;
pub mod resample;
pub mod smooth;


pub use align::align;
pub use resample::resample;
pub use smooth::{ema, sma, smooth, ExpMean, RollingMean, Smoother};

use crate::types::{Point, Row};

/// Extract one column of the table as a named series, one point per row
pub fn column_series(rows: &[Row], column: &str) -> Vec<Point> {
    rows.iter()
        .map(|row| Point {
            t: row.t.clone(),
            v: row.get(column),
        })
        .collect()
}
