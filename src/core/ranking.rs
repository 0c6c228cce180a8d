//! Leaderboards over a fetched asset list.
use crate::core::market::AssetSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMetric {
    MarketCap,
    Change24h,
    Price,
}

impl RankingMetric {
    /// Value used for ordering; a missing value ranks as zero.
    pub fn value(&self, asset: &AssetSnapshot) -> f64 {
        match self {
            RankingMetric::MarketCap => asset.market_cap,
            RankingMetric::Change24h => asset.price_change_percentage_24h.unwrap_or(0.0),
            RankingMetric::Price => asset.current_price,
        }
    }
}

/// The `n` assets with the highest `metric`, ties kept in input order.
pub fn top_by(assets: &[AssetSnapshot], metric: RankingMetric, n: usize) -> Vec<&AssetSnapshot> {
    let mut ranked: Vec<&AssetSnapshot> = assets.iter().collect();
    ranked.sort_by(|a, b| metric.value(b).total_cmp(&metric.value(a)));
    ranked.truncate(n);
    ranked
}
