//! Crypto Market Visualization Application
//!
//! Fetches the top coins by market cap and prints, exports or serves the
//! datasets behind the bubble, network, honeycomb and radial views.

mod export;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cryptoviz_core::{
    ApiConfig, CoinGeckoFeed, CryptoVisualizer, FeedConfig, FilterCriteria, LayoutOptions, StoreEvent,
    Timeframe, VisualizationStyle,
};

/// Crypto market visualizations from CoinGecko data
#[derive(Parser)]
#[command(name = "cryptoviz")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of a CoinGecko-compatible API
    #[arg(long, global = true, env = "CRYPTOVIZ_API_URL", default_value = "https://api.coingecko.com/api/v3")]
    api_url: String,

    /// Demo API key sent with every request
    #[arg(long, global = true, env = "CRYPTOVIZ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Number of coins to fetch
    #[arg(long, global = true, default_value_t = 100)]
    per_page: usize,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one visualization payload as JSON
    Snapshot(SnapshotArgs),

    /// Write a payload file for every style
    Export(ExportArgs),

    /// Print market-wide aggregates as JSON
    Overview {
        #[arg(long, default_value = "24h")]
        timeframe: Timeframe,
    },

    /// Serve the HTTP API with periodic refreshes
    Serve {
        #[arg(long, env = "CRYPTOVIZ_PORT", default_value_t = 8080)]
        port: u16,

        /// Seconds between refreshes
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        refresh_secs: u64,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// 24h, 7d or 30d
    #[arg(long, default_value = "24h")]
    timeframe: Timeframe,

    /// Keep at most this many of the top coins
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    max_count: i64,

    /// Case-insensitive name or symbol filter
    #[arg(long, default_value = "")]
    search: String,
}

impl SelectionArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_signed(self.max_count, self.search.clone())
    }
}

#[derive(Args)]
struct SnapshotArgs {
    /// bubble, network, honeycomb or radial
    #[arg(long, default_value = "bubble")]
    style: VisualizationStyle,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Override the style's radius offset
    #[arg(long)]
    base_offset: Option<f64>,

    /// Override the style's slot limit
    #[arg(long)]
    max_slots: Option<usize>,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[command(flatten)]
    selection: SelectionArgs,
}

impl Cli {
    fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            per_page: self.per_page,
            timeout: Duration::from_secs(self.timeout_secs),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let feed = CoinGeckoFeed::new(cli.feed_config())?;
    let visualizer = Arc::new(CryptoVisualizer::new(Arc::new(feed)));

    match cli.command {
        Commands::Snapshot(args) => {
            let mut options = LayoutOptions::for_style(args.style);
            if let Some(base_offset) = args.base_offset {
                options = options.with_base_offset(base_offset)?;
            }
            if args.max_slots.is_some() {
                options = options.with_max_slots(args.max_slots);
            }

            visualizer.refresh().await?;

            let criteria = args.selection.criteria();
            let payload = visualizer.payload_with(args.style, args.selection.timeframe, &criteria, &options);
            info!(
                nodes = payload.nodes.len(),
                links = payload.links.len(),
                "📊 Built {} payload",
                payload.style
            );
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Export(args) => {
            visualizer.refresh().await?;

            let criteria = args.selection.criteria();
            for style in VisualizationStyle::ALL {
                let options = LayoutOptions::for_style(style);
                let payload = visualizer.payload_with(style, args.selection.timeframe, &criteria, &options);
                let path = export::write_payload(&args.out_dir, &payload)?;
                info!("💾 Wrote {}", path.display());
            }
        }
        Commands::Overview { timeframe } => {
            visualizer.refresh().await?;

            let overview = visualizer.overview_for(timeframe);
            info!(
                gainers = overview.gainers,
                losers = overview.losers,
                "📈 Market overview for {}",
                timeframe
            );
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        Commands::Serve { port, refresh_secs } => {
            serve(visualizer, port, Duration::from_secs(refresh_secs)).await?;
        }
    }

    Ok(())
}

async fn serve(visualizer: Arc<CryptoVisualizer>, port: u16, refresh_every: Duration) -> Result<()> {
    info!("🚀 Starting cryptoviz server (feed: {})", visualizer.feed_name());

    let event_task = tokio::spawn(log_store_events(visualizer.subscribe()));

    if let Err(e) = visualizer.refresh().await {
        warn!("Initial fetch failed, serving empty state: {}", e);
    }

    let api_task = visualizer.start_api(ApiConfig::with_port(port));

    let refresher = visualizer.clone();
    let refresh_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_every);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = refresher.refresh().await {
                warn!("Scheduled refresh failed: {}", e);
            }
        }
    });

    info!("📊 Serving on port {}. Press Ctrl+C to stop.", port);

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Shutdown signal received...");
        }
        _ = api_task => {
            warn!("API server stopped");
        }
        _ = refresh_task => {
            warn!("Refresh loop stopped");
        }
    }

    event_task.abort();
    info!("✅ cryptoviz shutdown complete");
    Ok(())
}

/// Log store events until the store is dropped; returns how many were seen.
async fn log_store_events(mut events: broadcast::Receiver<StoreEvent>) -> u64 {
    let mut seen = 0;
    loop {
        match events.recv().await {
            Ok(StoreEvent::RecordsReplaced { request_id, count }) => {
                seen += 1;
                info!(request_id, count, "🔄 Records replaced");
            }
            Ok(other) => {
                seen += 1;
                debug!(?other, "Store event");
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "Store event logger fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
    seen
}
