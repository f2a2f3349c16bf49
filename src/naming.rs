//! Column naming for the wide table
//!
//! The numeric core never formats names itself; every column key and display
//! label goes through these functions so tags stay collision-free.

use crate::types::{Exchange, Field, MaKind};

/// Source-qualified column, e.g. `kraken_spread_L5_pct`
pub fn qualified_column(exchange: Exchange, field: Field) -> String {
    format!("{}_{}", exchange.id(), field.record_name())
}

/// Column holding `field` for `exchange` once sources are aligned.
///
/// A single source keeps plain record names since alignment is the identity.
pub fn base_column(exchange: Exchange, field: Field, multi_source: bool) -> String {
    if multi_source {
        qualified_column(exchange, field)
    } else {
        field.record_name().to_string()
    }
}

/// Smoothed series key, e.g. `coinbase_L5_SMA50`
pub fn series_tag(exchange: Exchange, field: Field, kind: MaKind, window: usize) -> String {
    format!(
        "{}_{}_{}{}",
        exchange.id(),
        field.metric_key(),
        kind.tag(),
        window
    )
}

/// Legend label, e.g. `L5 MA50` or `KRAKEN L5 EMA100` when comparing sources
pub fn series_label(
    exchange: Exchange,
    field: Field,
    kind: MaKind,
    window: usize,
    multi_source: bool,
) -> String {
    let base = format!("{} {}{}", field.metric_key(), kind.label(), window);
    if multi_source {
        format!("{} {}", exchange.id().to_uppercase(), base)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_column() {
        assert_eq!(
            qualified_column(Exchange::Kraken, Field::SpreadL5Pct),
            "kraken_spread_L5_pct"
        );
    }

    #[test]
    fn test_base_column_single_vs_multi() {
        assert_eq!(base_column(Exchange::Coinbase, Field::Mid, false), "mid");
        assert_eq!(base_column(Exchange::Coinbase, Field::Mid, true), "coinbase_mid");
    }

    #[test]
    fn test_series_tag() {
        assert_eq!(
            series_tag(Exchange::Coinbase, Field::SpreadL50Pct, MaKind::Sma, 50),
            "coinbase_L50_SMA50"
        );
        assert_eq!(
            series_tag(Exchange::Kraken, Field::SpreadL100Pct, MaKind::Ema, 200),
            "kraken_L100_EMA200"
        );
    }

    #[test]
    fn test_tags_do_not_collide_across_kinds() {
        let sma = series_tag(Exchange::Coinbase, Field::SpreadL5Pct, MaKind::Sma, 100);
        let ema = series_tag(Exchange::Coinbase, Field::SpreadL5Pct, MaKind::Ema, 100);
        assert_ne!(sma, ema);
    }

    #[test]
    fn test_series_label() {
        assert_eq!(
            series_label(Exchange::Coinbase, Field::SpreadL5Pct, MaKind::Sma, 50, false),
            "L5 MA50"
        );
        assert_eq!(
            series_label(Exchange::Kraken, Field::SpreadL5Pct, MaKind::Ema, 100, true),
            "KRAKEN L5 EMA100"
        );
    }
}
