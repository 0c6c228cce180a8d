use crate::core::market::{
    self, AssetSnapshot, HistoricalSeries, MarketDataError, MarketDataProvider, PricePoint, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

const VS_CURRENCY: &str = "usd";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Deserialize, Debug)]
struct MarketRecord {
    id: Option<String>,
    name: Option<String>,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
}

impl MarketRecord {
    fn into_snapshot(self, index: usize) -> Result<AssetSnapshot> {
        let missing = |field: &str| {
            MarketDataError::Malformed(format!("asset record {index} is missing `{field}`"))
        };
        Ok(AssetSnapshot {
            id: self.id.ok_or_else(|| missing("id"))?,
            name: self.name.ok_or_else(|| missing("name"))?,
            current_price: self.current_price.ok_or_else(|| missing("current_price"))?,
            price_change_percentage_24h: self.price_change_percentage_24h,
            market_cap: self.market_cap.ok_or_else(|| missing("market_cap"))?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    prices: Option<Vec<Vec<Option<f64>>>>,
}

pub struct CoinGeckoProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("coinxp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("Requesting market data from {}", url);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| MarketDataError::Network(format!("Request error: {e} URL: {url}")))?;

        if !response.status().is_success() {
            return Err(MarketDataError::Network(format!(
                "HTTP error: {} URL: {}",
                response.status(),
                url
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| MarketDataError::Malformed(format!("Failed to parse JSON response: {e}")))
    }
}

/// Orders points by time, keeps the latest value for repeated timestamps and
/// drops anything older than `days` before the newest point.
fn normalize_points(mut points: Vec<PricePoint>, days: u32) -> Vec<PricePoint> {
    points.sort_by_key(|p| p.timestamp);

    let mut unique: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match unique.last_mut() {
            Some(last) if last.timestamp == point.timestamp => *last = point,
            _ => unique.push(point),
        }
    }

    if let Some(newest) = unique.last().map(|p| p.timestamp) {
        let cutoff = newest - Duration::days(i64::from(days));
        unique.retain(|p| p.timestamp >= cutoff);
    }
    unique
}

fn parse_price_pair(index: usize, pair: &[Option<f64>]) -> Result<PricePoint> {
    let malformed = || MarketDataError::Malformed(format!("price entry {index} is not a [timestamp, price] pair"));
    let (ts_ms, price) = match pair {
        [Some(ts), Some(price)] => (*ts, *price),
        _ => return Err(malformed()),
    };
    let timestamp = DateTime::<Utc>::from_timestamp_millis(ts_ms as i64).ok_or_else(malformed)?;
    Ok(PricePoint { timestamp, price })
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoTopAssets", skip(self))]
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<AssetSnapshot>> {
        market::validate_limit(limit)?;

        let url = format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1",
            self.base_url, VS_CURRENCY, limit
        );
        let records: Vec<MarketRecord> = self.get_json(&url).await?;
        debug!(count = records.len(), "Received market records");

        let mut assets = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| record.into_snapshot(i))
            .collect::<Result<Vec<_>>>()?;

        // Stable, so upstream order survives among equal caps
        assets.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));
        assets.truncate(limit);
        Ok(assets)
    }

    #[instrument(name = "CoinGeckoHistory", skip(self))]
    async fn fetch_historical_series(&self, asset_id: &str, days: u32) -> Result<HistoricalSeries> {
        market::validate_series_request(asset_id, days)?;

        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url, asset_id, VS_CURRENCY, days
        );
        let chart: MarketChartResponse = self.get_json(&url).await?;
        let prices = chart.prices.ok_or_else(|| {
            MarketDataError::Malformed(format!("no `prices` in market chart for {asset_id}"))
        })?;

        let points = prices
            .iter()
            .enumerate()
            .map(|(i, pair)| parse_price_pair(i, pair))
            .collect::<Result<Vec<_>>>()?;
        let points = normalize_points(points, days);
        debug!(count = points.len(), "Received price points");

        Ok(HistoricalSeries {
            asset_id: asset_id.to_string(),
            days,
            points,
        })
    }
}
