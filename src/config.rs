//! Configuration management

use crate::types::{Asset, Exchange, Field, MaKind, Timeframe};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Object store prefix holding `{exchange}/{asset}/1min/{day}.jsonl`
    pub base_url: String,
    /// HTTP timeout per fetch in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Exchanges to chart; more than one switches to comparison columns
    pub exchanges: Vec<Exchange>,
    pub asset: Asset,
    /// Metric columns to smooth (record names or keys like `L5`)
    pub levels: Vec<Field>,
    /// Moving-average lookbacks, in rows
    pub windows: Vec<usize>,
    pub kinds: Vec<MaKind>,
    pub timeframe: Timeframe,
    /// Seconds between periodic refreshes
    pub refresh_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://storage.googleapis.com/bananazone".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            exchanges: vec![Exchange::Coinbase],
            asset: Asset::Btc,
            levels: vec![Field::SpreadL5Pct, Field::SpreadL50Pct],
            windows: vec![50, 100],
            kinds: vec![MaKind::Sma],
            timeframe: Timeframe::M1,
            refresh_interval_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus `SPREADSCOPE__*` variables
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();

        let settings = config::Config::builder()
            .add_source(config::File::from(Path::new(&expanded)).required(false))
            .add_source(
                config::Environment::with_prefix("SPREADSCOPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("dashboard.exchanges")
                    .with_list_parse_key("dashboard.levels")
                    .with_list_parse_key("dashboard.windows")
                    .with_list_parse_key("dashboard.kinds"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.feed.timeout_secs, 30);
        assert!(config.feed.base_url.ends_with("/bananazone"));
        assert_eq!(config.dashboard.exchanges, vec![Exchange::Coinbase]);
        assert_eq!(config.dashboard.windows, vec![50, 100]);
        assert_eq!(config.dashboard.kinds, vec![MaKind::Sma]);
        assert_eq!(config.dashboard.refresh_interval_secs, 60);
    }

    #[test]
    fn test_parse_toml_partial() {
        let config: Config = toml::from_str(
            r#"
            [dashboard]
            exchanges = ["coinbase", "kraken"]
            asset = "ETH"
            levels = ["L100", "spread_L5_pct"]
            kinds = ["sma", "ema"]
            timeframe = "15m"
            "#,
        )
        .unwrap();

        assert_eq!(config.dashboard.exchanges.len(), 2);
        assert_eq!(config.dashboard.asset, Asset::Eth);
        assert_eq!(
            config.dashboard.levels,
            vec![Field::SpreadL100Pct, Field::SpreadL5Pct]
        );
        assert_eq!(config.dashboard.timeframe, Timeframe::M15);
        // untouched keys keep defaults
        assert_eq!(config.dashboard.windows, vec![50, 100]);
        assert_eq!(config.feed.timeout_secs, 30);
    }

    #[test]
    fn test_parse_toml_numeric_timeframe() {
        let config: Config = toml::from_str("[dashboard]\ntimeframe = 60\n").unwrap();
        assert_eq!(config.dashboard.timeframe, Timeframe::M60);
    }

    #[test]
    fn test_parse_toml_rejects_unknown_level() {
        let result: Result<Config, _> = toml::from_str("[dashboard]\nlevels = [\"L7\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/spreadscope.toml").unwrap();
        assert_eq!(config.dashboard.asset, Asset::Btc);
    }

    #[test]
    fn test_load_env_overrides_lists() {
        // other load tests only inspect keys not set here
        let vars = [
            ("SPREADSCOPE__DASHBOARD__WINDOWS", "20,40,200"),
            ("SPREADSCOPE__DASHBOARD__EXCHANGES", "kraken,coinbase"),
            ("SPREADSCOPE__DASHBOARD__KINDS", "sma,ema"),
            ("SPREADSCOPE__DASHBOARD__TIMEFRAME", "15"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let loaded = Config::load("/nonexistent/spreadscope-env.toml");
        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let config = loaded.unwrap();
        assert_eq!(config.dashboard.windows, vec![20, 40, 200]);
        assert_eq!(
            config.dashboard.exchanges,
            vec![Exchange::Kraken, Exchange::Coinbase]
        );
        assert_eq!(config.dashboard.kinds, vec![MaKind::Sma, MaKind::Ema]);
        assert_eq!(config.dashboard.timeframe, Timeframe::M15);
        assert_eq!(config.dashboard.levels, vec![Field::SpreadL5Pct, Field::SpreadL50Pct]);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("spreadscope-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[feed]\nbase_url = \"https://example.com/b\"\ntimeout_secs = 3\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.feed.base_url, "https://example.com/b");
        assert_eq!(config.feed.timeout_secs, 3);
    }
}
