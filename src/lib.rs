//! Order-Book Spread Monitor
//!
//! Loads one-minute order-book snapshots per exchange, resamples them,
//! aligns exchanges by timestamp and attaches moving averages of the spread
//! metrics, producing a wide table ready for charting.

pub mod config;
pub mod error;
pub mod feed;
pub mod naming;
pub mod pipeline;
pub mod refresh;
pub mod series;
pub mod types;
pub mod view;
