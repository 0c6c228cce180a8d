pub mod history;
pub mod predict;
pub mod prices;
pub mod setup;
pub mod stats;
pub mod ui;

use crate::core::{AssetSnapshot, HistoricalSeries, MarketDataProvider};
use anyhow::{Context, Result, anyhow};

pub(crate) async fn load_top_assets(
    provider: &dyn MarketDataProvider,
    limit: usize,
) -> Result<Vec<AssetSnapshot>> {
    let spinner = ui::new_spinner("Fetching market data...");
    let result = provider.fetch_top_assets(limit).await;
    spinner.finish_and_clear();
    result.context("Failed to fetch cryptocurrency data")
}

pub(crate) async fn load_series(
    provider: &dyn MarketDataProvider,
    asset_id: &str,
    days: u32,
) -> Result<HistoricalSeries> {
    let spinner = ui::new_spinner("Fetching price history...");
    let result = provider.fetch_historical_series(asset_id, days).await;
    spinner.finish_and_clear();
    result.context("Failed to fetch historical price data")
}

/// Looks up an asset among those returned by the last top-assets fetch.
pub(crate) fn find_asset<'a>(assets: &'a [AssetSnapshot], id: &str) -> Result<&'a AssetSnapshot> {
    assets.iter().find(|a| a.id == id).ok_or_else(|| {
        anyhow!(
            "Unknown asset '{}': not among the top {} assets by market cap",
            id,
            assets.len()
        )
    })
}
