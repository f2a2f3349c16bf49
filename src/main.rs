//! Order-Book Spread Monitor
//!
//! Command-line front end: one-shot tables, JSON export and a watch mode that
//! refreshes periodically.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use spread_scope::{
    config::{Config, DashboardConfig},
    feed::{today_utc, HttpSnapshotSource, SnapshotSource},
    pipeline::{self, PipelineParams},
    refresh::{RefreshController, RefreshEvent},
    series::align,
    types::{Asset, Exchange, Field, MaKind, Timeframe},
    view,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spreadscope")]
#[command(about = "Order-book spread monitor for crypto exchanges")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,
}

/// Overrides for the dashboard section of the config
#[derive(Args, Debug, Clone)]
struct Selection {
    /// Exchange to load; repeat to compare exchanges
    #[arg(short, long = "exchange")]
    exchanges: Vec<Exchange>,

    /// Asset symbol (BTC, ETH, ADA, XRP)
    #[arg(short, long)]
    asset: Option<Asset>,

    /// Column to smooth (L5, L50, L100, mid, VB50, VA50); repeatable
    #[arg(short, long = "level")]
    levels: Vec<Field>,

    /// Moving-average window in rows; repeatable
    #[arg(short, long = "window")]
    windows: Vec<usize>,

    /// Moving-average kind (sma, ema); repeatable
    #[arg(short, long = "kind")]
    kinds: Vec<MaKind>,

    /// Resolution (1m, 5m, 15m, 60m)
    #[arg(short, long)]
    timeframe: Option<Timeframe>,

    /// UTC day to load (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    day: Option<NaiveDate>,
}

impl Selection {
    fn params(&self, defaults: &DashboardConfig) -> PipelineParams {
        let mut params = PipelineParams::from_config(defaults, self.day.unwrap_or_else(today_utc));
        if !self.exchanges.is_empty() {
            params.exchanges = self.exchanges.clone();
        }
        if let Some(asset) = self.asset {
            params.asset = asset;
        }
        if !self.levels.is_empty() {
            params.columns = self.levels.clone();
        }
        if !self.windows.is_empty() {
            params.windows = self.windows.clone();
        }
        if !self.kinds.is_empty() {
            params.kinds = self.kinds.clone();
        }
        if let Some(timeframe) = self.timeframe {
            params.timeframe = timeframe;
        }
        params
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh once and print the smoothed series
    Show {
        #[command(flatten)]
        selection: Selection,

        /// Number of most recent rows to print
        #[arg(short, long, default_value = "20")]
        rows: usize,
    },
    /// Print the raw one-minute fields of one exchange
    Raw {
        #[arg(short, long, default_value = "coinbase")]
        exchange: Exchange,

        #[arg(short, long, default_value = "BTC")]
        asset: Asset,

        /// UTC day to load (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        day: Option<NaiveDate>,

        #[arg(short, long, default_value = "20")]
        rows: usize,
    },
    /// Refresh periodically and print every new table
    Watch {
        #[command(flatten)]
        selection: Selection,

        #[arg(short, long, default_value = "10")]
        rows: usize,

        /// Seconds between refreshes (overrides config)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Refresh once and print the wide table as JSON
    Export {
        #[command(flatten)]
        selection: Selection,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging; stdout is reserved for tables and JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;
    let source = HttpSnapshotSource::new(&config.feed)?;

    match cli.command {
        Commands::Show { selection, rows } => show(&config, &source, &selection, rows).await,
        Commands::Raw {
            exchange,
            asset,
            day,
            rows,
        } => show_raw(&source, exchange, asset, day.unwrap_or_else(today_utc), rows).await,
        Commands::Watch {
            selection,
            rows,
            interval_secs,
        } => {
            let interval = interval_secs.unwrap_or(config.dashboard.refresh_interval_secs);
            watch_tables(&config, source, selection, rows, interval).await
        }
        Commands::Export { selection, pretty } => {
            export(&config, &source, &selection, pretty).await
        }
    }
}

async fn show(
    config: &Config,
    source: &HttpSnapshotSource,
    selection: &Selection,
    rows: usize,
) -> anyhow::Result<()> {
    let params = selection.params(&config.dashboard);
    let table = pipeline::run(source, &params).await?;
    let chart = view::smoothed_chart(&params, &table.series);

    println!("\n{} [{}]\n", chart.title, params.day);
    if chart.series.is_empty() {
        println!("No smoothed series selected");
        return Ok(());
    }
    print!("{}", view::render_table(&table.rows, &chart.series, rows));
    println!("\n{} rows total", table.len());
    Ok(())
}

async fn show_raw(
    source: &HttpSnapshotSource,
    exchange: Exchange,
    asset: Asset,
    day: NaiveDate,
    rows: usize,
) -> anyhow::Result<()> {
    let batch = source.fetch_day(exchange, asset, day).await?;
    let mut sources = BTreeMap::new();
    sources.insert(exchange, batch);
    let table = align(&sources, &Field::ALL);

    for panel in view::raw_panels(exchange, asset) {
        println!("\n{} [{}]\n", panel.title, day);
        print!("{}", view::render_table(&table, &panel.series, rows));
    }
    println!(
        "\nData source: {}",
        spread_scope::feed::snapshot_url(source.base_url(), exchange, asset, day)
    );
    Ok(())
}

async fn export(
    config: &Config,
    source: &HttpSnapshotSource,
    selection: &Selection,
    pretty: bool,
) -> anyhow::Result<()> {
    let params = selection.params(&config.dashboard);
    let table = pipeline::run(source, &params).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&table)?
    } else {
        serde_json::to_string(&table)?
    };
    println!("{}", json);
    Ok(())
}

async fn watch_tables(
    config: &Config,
    source: HttpSnapshotSource,
    selection: Selection,
    rows: usize,
    interval_secs: u64,
) -> anyhow::Result<()> {
    let controller = Arc::new(RefreshController::new(selection.params(&config.dashboard)));
    let source: Arc<dyn SnapshotSource> = Arc::new(source);
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut updates = controller.subscribe();

    tracing::info!("Refreshing every {} seconds, Ctrl-C to stop", interval_secs);
    let scheduler = tokio::spawn(Arc::clone(&controller).run_periodic(
        source,
        Duration::from_secs(interval_secs.max(1)),
        stop_rx,
    ));

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let event = *updates.borrow_and_update();
                match event {
                    Some(RefreshEvent::Published(_)) => print_displayed(&controller, rows),
                    Some(RefreshEvent::Failed(_)) => print_failure(&controller),
                    None => {}
                }

                // Follow the UTC day unless one was pinned
                if selection.day.is_none() && controller.params().day != today_utc() {
                    controller.reconfigure(selection.params(&config.dashboard));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    stop_tx.send(true).ok();
    scheduler.await?;
    Ok(())
}

fn print_displayed(controller: &RefreshController, rows: usize) {
    let Some(shown) = controller.displayed() else {
        return;
    };
    let chart = view::smoothed_chart(&controller.params(), &shown.table.series);
    println!(
        "\n{} [refreshed {}]\n",
        chart.title,
        shown.refreshed_at.format("%H:%M:%S UTC")
    );
    print!("{}", view::render_table(&shown.table.rows, &chart.series, rows));
}

fn print_failure(controller: &RefreshController) {
    let Some(failure) = controller.last_error() else {
        return;
    };
    println!(
        "\nRefresh failed at {}: {}",
        failure.at.format("%H:%M:%S UTC"),
        failure.message
    );
    match controller.displayed() {
        Some(shown) => println!(
            "Still showing the table refreshed at {}",
            shown.refreshed_at.format("%H:%M:%S UTC")
        ),
        None => println!("No data loaded yet"),
    }
}
