//! Core types shared by the feed, the series core and the pipeline

use crate::error::SpreadError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Exchange publishing order-book snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Coinbase,
    Kraken,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Coinbase, Exchange::Kraken];

    /// Lowercase identifier used in resource paths and column prefixes
    pub fn id(&self) -> &'static str {
        match self {
            Exchange::Coinbase => "coinbase",
            Exchange::Kraken => "kraken",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Exchange {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exchange::ALL
            .into_iter()
            .find(|ex| ex.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SpreadError::InvalidParameter(format!("unknown exchange '{}'", s)))
    }
}

/// Traded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Ada,
    Xrp,
}

impl Asset {
    pub const ALL: [Asset; 4] = [Asset::Btc, Asset::Eth, Asset::Ada, Asset::Xrp];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Ada => "ADA",
            Asset::Xrp => "XRP",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::ALL
            .into_iter()
            .find(|a| a.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SpreadError::InvalidParameter(format!("unknown asset '{}'", s)))
    }
}

/// Numeric fields kept from a snapshot record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Field {
    Mid,
    SpreadL5Pct,
    SpreadL50Pct,
    SpreadL100Pct,
    VolL50Bids,
    VolL50Asks,
}

impl Field {
    pub const COUNT: usize = 6;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Mid,
        Field::SpreadL5Pct,
        Field::SpreadL50Pct,
        Field::SpreadL100Pct,
        Field::VolL50Bids,
        Field::VolL50Asks,
    ];

    /// Spread depth levels offered as smoothing columns
    pub const LEVELS: [Field; 3] = [Field::SpreadL5Pct, Field::SpreadL50Pct, Field::SpreadL100Pct];

    /// Key of the field in a snapshot record
    pub fn record_name(&self) -> &'static str {
        match self {
            Field::Mid => "mid",
            Field::SpreadL5Pct => "spread_L5_pct",
            Field::SpreadL50Pct => "spread_L50_pct",
            Field::SpreadL100Pct => "spread_L100_pct",
            Field::VolL50Bids => "vol_L50_bids",
            Field::VolL50Asks => "vol_L50_asks",
        }
    }

    /// Short key used in smoothed series tags and labels
    pub fn metric_key(&self) -> &'static str {
        match self {
            Field::Mid => "mid",
            Field::SpreadL5Pct => "L5",
            Field::SpreadL50Pct => "L50",
            Field::SpreadL100Pct => "L100",
            Field::VolL50Bids => "VB50",
            Field::VolL50Asks => "VA50",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.record_name())
    }
}

impl FromStr for Field {
    type Err = SpreadError;

    /// Accepts either the record name (`spread_L5_pct`) or the metric key (`L5`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.record_name() == s || f.metric_key().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpreadError::InvalidParameter(format!("unknown field '{}'", s)))
    }
}

impl TryFrom<String> for Field {
    type Error = SpreadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Field> for String {
    fn from(field: Field) -> Self {
        field.record_name().to_string()
    }
}

/// Drop NaN and infinities; they are absent values, not numbers
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// One timestamped snapshot with the fixed field subset
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// ISO-8601 timestamp, minute granularity
    pub t: String,
    values: [Option<f64>; Field::COUNT],
}

impl Observation {
    pub fn new(t: impl Into<String>) -> Self {
        Self {
            t: t.into(),
            values: [None; Field::COUNT],
        }
    }

    pub fn with(mut self, field: Field, value: Option<f64>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        self.values[field.index()] = finite(value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (Field, Option<f64>)> + '_ {
        Field::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}

/// Entry of a named or smoothed series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub t: String,
    pub v: Option<f64>,
}

impl Point {
    pub fn new(t: impl Into<String>, v: Option<f64>) -> Self {
        Self { t: t.into(), v: finite(v) }
    }
}

/// Row of the merged / wide table, keyed by timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub t: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl Row {
    pub fn new(t: impl Into<String>) -> Self {
        Self {
            t: t.into(),
            values: BTreeMap::new(),
        }
    }

    /// Value of a column; missing columns read as absent
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Option<f64>) {
        self.values.insert(column.into(), finite(value));
    }
}

/// Chart resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimeframeRepr", into = "String")]
pub enum Timeframe {
    #[default]
    M1,
    M5,
    M15,
    M60,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [Timeframe::M1, Timeframe::M5, Timeframe::M15, Timeframe::M60];

    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M60 => 60,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Timeframe::ALL.into_iter().find(|tf| tf.minutes() == minutes)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

impl FromStr for Timeframe {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let minutes = if s == "1h" {
            Some(60)
        } else {
            s.strip_suffix('m').unwrap_or(s.as_str()).parse::<u32>().ok()
        };
        minutes
            .and_then(Timeframe::from_minutes)
            .ok_or_else(|| SpreadError::InvalidParameter(format!("unsupported timeframe '{}'", s)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeframeRepr {
    Minutes(u32),
    Text(String),
}

impl TryFrom<TimeframeRepr> for Timeframe {
    type Error = SpreadError;

    fn try_from(repr: TimeframeRepr) -> Result<Self, Self::Error> {
        match repr {
            TimeframeRepr::Minutes(m) => Timeframe::from_minutes(m).ok_or_else(|| {
                SpreadError::InvalidParameter(format!("unsupported timeframe {}m", m))
            }),
            TimeframeRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

/// Moving-average algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    Sma,
    Ema,
}

impl MaKind {
    /// Text used in column tags (`SMA50`)
    pub fn tag(&self) -> &'static str {
        match self {
            MaKind::Sma => "SMA",
            MaKind::Ema => "EMA",
        }
    }

    /// Text used in display labels (`MA50`)
    pub fn label(&self) -> &'static str {
        match self {
            MaKind::Sma => "MA",
            MaKind::Ema => "EMA",
        }
    }
}

impl FromStr for MaKind {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" | "ma" => Ok(MaKind::Sma),
            "ema" => Ok(MaKind::Ema),
            other => Err(SpreadError::InvalidParameter(format!(
                "unknown moving average '{}'",
                other
            ))),
        }
    }
}

/// Parse a snapshot timestamp as UTC; zone-less timestamps are taken as UTC
pub fn parse_timestamp(t: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(t) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(t, fmt).ok())
        .map(|naive| naive.and_utc())
}
