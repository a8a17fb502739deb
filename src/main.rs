//! Statistics collector - fetches today's export and rebuilds the date index

use anyhow::Result;
use chrono::Local;
use mooncakes_stats::collect::{self, index};
use std::env;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    // Load optional .env overrides
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    info!("Starting statistics collection");
    let today = Local::now().date_naive();

    info!("Step 1/2: Collecting snapshot for {}...", today);
    let path = collect::collect_snapshot(&config.stats_url, &config.data_dir, today).await?;
    info!("✓ Snapshot written to {:?}", path);

    info!("Step 2/2: Rebuilding index...");
    let idx = index::build_index(&config.data_dir)?;
    index::write_index(&config.data_dir, &idx)?;
    info!("✓ Index covers {} snapshots", idx.dates.len());

    info!("Statistics collection complete");

    Ok(())
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
struct Config {
    stats_url: String,
    data_dir: PathBuf,
}

impl Config {
    fn from_env() -> Self {
        Config {
            stats_url: env::var("STATS_URL").unwrap_or_else(|_| {
                "https://mooncakes.io/api/v0/modules/statistics?raw=true".to_string()
            }),

            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
        }
    }
}
