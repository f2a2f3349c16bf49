//! Unit tests for the feed module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::FeedConfig;
    use crate::error::SpreadError;
    use crate::types::{Asset, Exchange, Field, Observation};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
    }

    #[test]
    fn test_snapshot_url_layout() {
        let url = snapshot_url(
            "https://storage.googleapis.com/bananazone/",
            Exchange::Kraken,
            Asset::Eth,
            day(),
        );
        assert_eq!(
            url,
            "https://storage.googleapis.com/bananazone/kraken/ETH/1min/2025-03-09.jsonl"
        );
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let body = r#"
{"t":"2025-03-09T00:00:00Z","mid":100.5,"spread_L5_pct":0.01,"spread_L50_pct":0.05,"spread_L100_pct":0.09,"vol_L50_bids":12.0,"vol_L50_asks":11.5}

   {"t":"2025-03-09T00:01:00Z","mid":101.0}
"#;
        let obs = parse_ndjson(body).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].get(Field::Mid), Some(100.5));
        assert_eq!(obs[0].get(Field::VolL50Asks), Some(11.5));
        assert_eq!(obs[1].t, "2025-03-09T00:01:00Z");
        assert_eq!(obs[1].get(Field::SpreadL5Pct), None);
    }

    #[test]
    fn test_parse_ndjson_bad_line_fails_batch() {
        let body = "{\"t\":\"2025-03-09T00:00:00Z\",\"mid\":1}\n{\"t\": oops}\n";
        let err = parse_ndjson(body).unwrap_err();
        assert!(matches!(err, SpreadError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_ndjson_empty_body() {
        assert!(parse_ndjson("").unwrap().is_empty());
        assert!(parse_ndjson("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_normalize_non_numeric_is_absent() {
        let value = serde_json::json!({
            "t": "2025-03-09T00:02:00Z",
            "mid": "101.2",
            "spread_L5_pct": null,
            "spread_L50_pct": true,
            "spread_L100_pct": 0.3,
            "vol_L50_bids": {"x": 1},
            "extra": 42
        });
        let obs = normalize_record(&value).unwrap();
        assert_eq!(obs.get(Field::Mid), None);
        assert_eq!(obs.get(Field::SpreadL5Pct), None);
        assert_eq!(obs.get(Field::SpreadL50Pct), None);
        assert_eq!(obs.get(Field::SpreadL100Pct), Some(0.3));
        assert_eq!(obs.get(Field::VolL50Bids), None);
        assert_eq!(obs.get(Field::VolL50Asks), None);
    }

    #[test]
    fn test_normalize_requires_timestamp() {
        assert!(normalize_record(&serde_json::json!({"mid": 1.0})).is_none());
        assert!(normalize_record(&serde_json::json!({"t": "", "mid": 1.0})).is_none());
        assert!(normalize_record(&serde_json::json!({"t": 5, "mid": 1.0})).is_none());
        assert!(normalize_record(&serde_json::json!([1, 2])).is_none());
    }

    #[test]
    fn test_http_source_trims_base_url() {
        let config = FeedConfig {
            base_url: "https://example.com/bucket///".to_string(),
            timeout_secs: 5,
        };
        let source = HttpSnapshotSource::new(&config).unwrap();
        assert_eq!(source.base_url(), "https://example.com/bucket");
        assert_eq!(source.name(), "http");
    }

    #[tokio::test]
    async fn test_mock_serves_series() {
        let series = vec![Observation::new("2025-03-09T00:00:00Z").with(Field::Mid, Some(1.0))];
        let mock = MockSnapshotSource::new().with_series(Exchange::Coinbase, Asset::Btc, series.clone());

        let got = mock.fetch_day(Exchange::Coinbase, Asset::Btc, day()).await.unwrap();
        assert_eq!(got, series);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_missing_file_is_404() {
        let mock = MockSnapshotSource::new();
        let err = mock.fetch_day(Exchange::Kraken, Asset::Ada, day()).await.unwrap_err();
        assert!(matches!(err, SpreadError::Fetch { status: 404, .. }));
    }

    #[test]
    fn test_mock_failure_and_recovery() {
        let mock = MockSnapshotSource::new().with_series(Exchange::Kraken, Asset::Btc, vec![]);
        mock.fail_exchange(Exchange::Kraken);
        let result = tokio_test::block_on(mock.fetch_day(Exchange::Kraken, Asset::Btc, day()));
        assert!(matches!(result, Err(SpreadError::Internal(_))));

        mock.recover(Exchange::Kraken);
        let result = tokio_test::block_on(mock.fetch_day(Exchange::Kraken, Asset::Btc, day()));
        assert!(result.unwrap().is_empty());
        assert_eq!(mock.call_count(), 2);
    }
}
