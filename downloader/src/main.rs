use anyhow::{Context, Result};
use candle_store::prelude::*;
use chrono::Utc;
use shared::Config;
use tracing_subscriber::EnvFilter;

fn read_instruments(path: &str) -> Result<Vec<InstrumentConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read instruments file {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid instruments file {}", path))
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(
        "Starting candle downloader v{} ({}@{}, built {})...",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_BRANCH"),
        env!("GIT_HASH"),
        env!("BUILD_TIME")
    );

    let config = Config::from_env().context("INVEST_TOKEN must be set")?;
    let instruments = read_instruments(&config.instruments_file)?;
    if instruments.is_empty() {
        tracing::warn!("No instruments in {}, nothing to do", config.instruments_file);
        return Ok(());
    }
    tracing::info!("{} instruments requested", instruments.len());

    let now = Utc::now();
    let from = instruments.iter().map(|i| i.from).min().unwrap_or(now);
    let uids: Vec<String> = instruments.iter().map(|i| i.uid.clone()).collect();

    let source = InvestRestClient::new(config.api_base_url, config.api_token);
    let storage = CandleStorage::open(
        OpenRequest {
            db_path: config.database_path,
            instruments,
            update: config.update_on_start,
            from,
            to: now,
        },
        source,
    )
    .await?;
    tracing::info!(
        "{} instruments loaded, {} candles in working set",
        storage.working_set().instrument_count(),
        storage.working_set().len()
    );

    for uid in &uids {
        let Some(window) = storage.working_set().get(uid) else {
            continue;
        };
        let stored = storage.repository().count_candles(uid).await?;
        tracing::info!(
            "{}: {} candles stored, {} loaded covering {} .. {}",
            storage.ticker(uid),
            stored,
            window.len(),
            window.covered_from(),
            window.covered_to()
        );
    }

    storage.close().await?;
    tracing::info!("Candle storage closed");
    Ok(())
}
