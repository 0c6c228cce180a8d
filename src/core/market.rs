//! Market data abstractions and core types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// Largest page size the upstream markets endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 250;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(e: reqwest::Error) -> Self {
        MarketDataError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;

/// One asset's market metrics at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub id: String,
    pub name: String,
    pub current_price: f64,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Price observations for one asset, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub asset_id: String,
    pub days: u32,
    pub points: Vec<PricePoint>,
}

impl HistoricalSeries {
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// Identifies a memoized gateway call by operation and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    TopAssets { limit: usize },
    HistoricalSeries { asset_id: String, days: u32 },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TopAssets { limit } => write!(f, "top_assets(limit={limit})"),
            CacheKey::HistoricalSeries { asset_id, days } => {
                write!(f, "historical_series(asset_id={asset_id}, days={days})")
            }
        }
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Top `limit` assets ordered by descending market capitalization.
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<AssetSnapshot>>;

    /// USD price series for `asset_id` over the last `days` days.
    async fn fetch_historical_series(&self, asset_id: &str, days: u32) -> Result<HistoricalSeries>;
}

pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(MarketDataError::InvalidArgument(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
        )));
    }
    Ok(())
}

pub fn validate_series_request(asset_id: &str, days: u32) -> Result<()> {
    if asset_id.trim().is_empty() {
        return Err(MarketDataError::InvalidArgument(
            "asset id must not be empty".to_string(),
        ));
    }
    if days == 0 {
        return Err(MarketDataError::InvalidArgument(
            "days must be a positive integer".to_string(),
        ));
    }
    Ok(())
}
