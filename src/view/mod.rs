//! Chart descriptors and terminal rendering
//!
//! The chart itself is drawn elsewhere; this module only describes which
//! columns to plot and prints tables for the CLI.

use crate::pipeline::{PipelineParams, SeriesLabel};
use crate::types::{Asset, Exchange, Field, Row};
use serde::Serialize;
use std::fmt::Write as _;

/// A line chart keyed on the timestamp column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_key: &'static str,
    pub series: Vec<SeriesLabel>,
}

fn label(data_key: &str, label: &str) -> SeriesLabel {
    SeriesLabel {
        data_key: data_key.to_string(),
        label: label.to_string(),
    }
}

/// Chart of the smoothed spread series of a refresh
pub fn smoothed_chart(params: &PipelineParams, series: &[SeriesLabel]) -> ChartSpec {
    let exchanges = params.distinct_exchanges();
    let title = if exchanges.len() == 1 {
        format!(
            "{} {} spread % of mid (MAs, {})",
            exchanges[0].id().to_uppercase(),
            params.asset,
            params.timeframe
        )
    } else {
        format!("{} spread % of mid (MAs, {})", params.asset, params.timeframe)
    };

    ChartSpec {
        title,
        x_key: "t",
        series: series.to_vec(),
    }
}

/// Raw one-minute panels for a single exchange: spreads, mid, L50 volume
pub fn raw_panels(exchange: Exchange, asset: Asset) -> Vec<ChartSpec> {
    vec![
        ChartSpec {
            title: format!(
                "{} {} spread % of mid (L5/L50/L100)",
                exchange.id().to_uppercase(),
                asset
            ),
            x_key: "t",
            series: vec![
                label(Field::SpreadL5Pct.record_name(), "L5 %"),
                label(Field::SpreadL50Pct.record_name(), "L50 %"),
                label(Field::SpreadL100Pct.record_name(), "L100 %"),
            ],
        },
        ChartSpec {
            title: "Mid price".to_string(),
            x_key: "t",
            series: vec![label(Field::Mid.record_name(), "mid")],
        },
        ChartSpec {
            title: "Volume to L50 (bids vs asks)".to_string(),
            x_key: "t",
            series: vec![
                label(Field::VolL50Bids.record_name(), "vol L50 bids"),
                label(Field::VolL50Asks.record_name(), "vol L50 asks"),
            ],
        },
    ]
}

/// `HH:MM` axis tick of an ISO timestamp
pub fn fmt_time(iso: &str) -> &str {
    iso.get(11..16).unwrap_or("")
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1000.0 => format!("{:.2}", v),
        Some(v) => format!("{:.5}", v),
        None => "-".to_string(),
    }
}

/// Print the last `limit` rows of `rows` for the given series as columns
pub fn render_table(rows: &[Row], series: &[SeriesLabel], limit: usize) -> String {
    let widths: Vec<usize> = series
        .iter()
        .map(|s| s.label.len().max(12))
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{:<6}", "time");
    for (s, w) in series.iter().zip(&widths) {
        let _ = write!(out, " {:>w$}", s.label, w = *w);
    }
    out.push('\n');
    let total: usize = 6 + widths.iter().map(|w| w + 1).sum::<usize>();
    out.push_str(&"-".repeat(total));
    out.push('\n');

    let start = rows.len().saturating_sub(limit);
    for row in &rows[start..] {
        let _ = write!(out, "{:<6}", fmt_time(&row.t));
        for (s, w) in series.iter().zip(&widths) {
            let _ = write!(out, " {:>w$}", format_value(row.get(&s.data_key)), w = *w);
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MaKind, Timeframe};
    use chrono::NaiveDate;

    fn params(exchanges: Vec<Exchange>) -> PipelineParams {
        PipelineParams {
            asset: Asset::Eth,
            exchanges,
            columns: vec![Field::SpreadL5Pct],
            windows: vec![50],
            kinds: vec![MaKind::Sma],
            timeframe: Timeframe::M5,
            day: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time("2025-01-01T13:47:00Z"), "13:47");
        assert_eq!(fmt_time("2025-01-01"), "");
        assert_eq!(fmt_time(""), "");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None), "-");
        assert_eq!(format_value(Some(0.012345678)), "0.01235");
        assert_eq!(format_value(Some(43210.129)), "43210.13");
    }

    #[test]
    fn test_smoothed_chart_titles() {
        let single = smoothed_chart(&params(vec![Exchange::Kraken]), &[]);
        assert_eq!(single.title, "KRAKEN ETH spread % of mid (MAs, 5m)");
        assert_eq!(single.x_key, "t");

        let multi = smoothed_chart(&params(vec![Exchange::Kraken, Exchange::Coinbase]), &[]);
        assert_eq!(multi.title, "ETH spread % of mid (MAs, 5m)");
    }

    #[test]
    fn test_raw_panels_use_record_names() {
        let panels = raw_panels(Exchange::Coinbase, Asset::Btc);
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0].series[1].data_key, "spread_L50_pct");
        assert_eq!(panels[2].series[0].label, "vol L50 bids");
    }

    #[test]
    fn test_render_table_tail() {
        let rows: Vec<Row> = (0..5)
            .map(|m| {
                let mut row = Row::new(format!("2025-01-01T00:{:02}:00Z", m));
                row.insert("mid", if m == 4 { None } else { Some(m as f64) });
                row
            })
            .collect();
        let series = vec![label("mid", "mid")];

        let text = render_table(&rows, &series, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("time"));
        assert!(lines[2].starts_with("00:03"));
        assert!(lines[2].ends_with("3.00000"));
        assert!(lines[3].ends_with('-'));
    }
}
