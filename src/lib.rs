pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::{CacheTtl, CachingMarketDataProvider, CoinGeckoProvider};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

/// CoinGecko access with time-boxed memoization.
pub type Gateway = CachingMarketDataProvider<CoinGeckoProvider>;

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Prices {
        ids: Vec<String>,
        watch_secs: Option<u64>,
    },
    Stats,
    History {
        coin: String,
        days: u32,
        rows: usize,
    },
    Predict {
        coin: String,
        horizon: u32,
    },
}

pub fn build_gateway(config: &AppConfig) -> Result<Gateway> {
    let coingecko = &config.providers.coingecko;
    let provider = CoinGeckoProvider::new(&coingecko.base_url, coingecko.api_key.clone())
        .context("Failed to create CoinGecko client")?;
    Ok(CachingMarketDataProvider::new(
        provider,
        CacheTtl::from(&config.cache),
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coinxp starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let gateway = build_gateway(&config)?;
    let top_limit = config.top_limit;

    match command {
        AppCommand::Prices { ids, watch_secs } => {
            cli::prices::run(
                &gateway,
                top_limit,
                &ids,
                watch_secs.map(Duration::from_secs),
            )
            .await
        }
        AppCommand::Stats => cli::stats::run(&gateway, top_limit).await,
        AppCommand::History { coin, days, rows } => {
            cli::history::run(&gateway, top_limit, &coin, days, rows).await
        }
        AppCommand::Predict { coin, horizon } => {
            cli::predict::run(&gateway, top_limit, &coin, horizon, &config.forecast).await
        }
    }
}
