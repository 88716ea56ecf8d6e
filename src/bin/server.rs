//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Process entry point: loads configuration, wires the journal and matching engine, recovers
// prior state, spawns the periodic snapshot task, and serves the HTTP frontend until shutdown.
//--------------------------------------------------------------------------------------------------

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use limit_matching_engine::api::Api;
use limit_matching_engine::config::Config;
use limit_matching_engine::engine::MatchingEngine;
use limit_matching_engine::journal::{FileJournal, Journal, NullJournal};

#[derive(Parser, Debug)]
#[command(about = "Limit order matching engine HTTP server")]
struct Args {
    /// Overrides BIND_ADDR from the environment.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let journal: Arc<dyn Journal> = match &config.journal_uri {
        Some(uri) => Arc::new(FileJournal::from_uri(uri)?),
        None => Arc::new(NullJournal),
    };

    let engine = Arc::new(
        MatchingEngine::new(journal, config.snapshot_dir.clone()).with_snapshot_retention(5),
    );

    if let Err(e) = engine.recover() {
        error!(error = %e, "refusing to start: recovery failed");
        return Err(e.into());
    }

    if config.snapshot_interval_sec > 0 {
        spawn_snapshot_task(engine.clone(), config.snapshot_interval_sec as u64);
    }

    let bind_addr = args
        .bind
        .or_else(|| config.bind_addr.parse().ok())
        .unwrap_or_else(|| "127.0.0.1:8080".parse().unwrap());

    Api::new(bind_addr, engine).serve().await?;
    Ok(())
}

fn spawn_snapshot_task(engine: Arc<MatchingEngine>, interval_sec: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_sec));
        loop {
            ticker.tick().await;
            match engine.snapshot() {
                Ok(path) => info!(path = %path.display(), "periodic snapshot complete"),
                Err(e) => error!(error = %e, "periodic snapshot failed"),
            }
        }
    });
}
