use crate::core::cache::Cache;
use crate::core::config::CacheConfig;
use crate::core::market::{
    AssetSnapshot, CacheKey, HistoricalSeries, MarketDataProvider, Result,
};
use crate::store::memory::MemoryCache;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Time-to-live per gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub top_assets: Duration,
    pub historical_series: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        CacheTtl {
            top_assets: Duration::from_secs(5 * 60),
            historical_series: Duration::from_secs(10 * 60),
        }
    }
}

impl From<&CacheConfig> for CacheTtl {
    fn from(config: &CacheConfig) -> Self {
        CacheTtl {
            top_assets: config.top_assets_ttl(),
            historical_series: config.historical_series_ttl(),
        }
    }
}

/// Memoizes successful results of the wrapped provider per exact parameters.
/// Failures always go back to the inner provider on the next call.
pub struct CachingMarketDataProvider<T: MarketDataProvider> {
    inner: T,
    ttl: CacheTtl,
    assets: MemoryCache<CacheKey, Vec<AssetSnapshot>>,
    series: MemoryCache<CacheKey, HistoricalSeries>,
}

impl<T: MarketDataProvider> CachingMarketDataProvider<T> {
    pub fn new(inner: T, ttl: CacheTtl) -> Self {
        Self {
            inner,
            ttl,
            assets: MemoryCache::new(),
            series: MemoryCache::new(),
        }
    }
}

#[async_trait]
impl<T: MarketDataProvider> MarketDataProvider for CachingMarketDataProvider<T> {
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<AssetSnapshot>> {
        let key = CacheKey::TopAssets { limit };
        if let Some(cached) = self.assets.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(cached);
        }
        debug!("Cache miss for {}", key);

        let assets = self.inner.fetch_top_assets(limit).await?;
        self.assets
            .put(key, assets.clone(), Some(self.ttl.top_assets))
            .await;
        Ok(assets)
    }

    async fn fetch_historical_series(&self, asset_id: &str, days: u32) -> Result<HistoricalSeries> {
        let key = CacheKey::HistoricalSeries {
            asset_id: asset_id.to_string(),
            days,
        };
        if let Some(cached) = self.series.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(cached);
        }
        debug!("Cache miss for {}", key);

        let series = self.inner.fetch_historical_series(asset_id, days).await?;
        self.series
            .put(key, series.clone(), Some(self.ttl.historical_series))
            .await;
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::{MarketDataError, PricePoint};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::sleep;

    struct MockInnerProvider {
        asset_calls: AtomicUsize,
        series_calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl MockInnerProvider {
        fn new() -> Self {
            Self {
                asset_calls: AtomicUsize::new(0),
                series_calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockInnerProvider {
        async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<AssetSnapshot>> {
            self.asset_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(MarketDataError::Network("connection reset".to_string()));
            }
            Ok((0..limit)
                .map(|i| AssetSnapshot {
                    id: format!("coin{i}"),
                    name: format!("Coin {i}"),
                    current_price: 1.0,
                    price_change_percentage_24h: None,
                    market_cap: (limit - i) as f64,
                })
                .collect())
        }

        async fn fetch_historical_series(
            &self,
            asset_id: &str,
            days: u32,
        ) -> Result<HistoricalSeries> {
            self.series_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(MarketDataError::Malformed("no `prices`".to_string()));
            }
            Ok(HistoricalSeries {
                asset_id: asset_id.to_string(),
                days,
                points: vec![PricePoint {
                    timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                    price: 42.0,
                }],
            })
        }
    }

    fn short_ttl() -> CacheTtl {
        CacheTtl {
            top_assets: Duration::from_millis(30),
            historical_series: Duration::from_millis(30),
        }
    }

    #[test]
    fn test_default_ttls() {
        let ttl = CacheTtl::default();
        assert_eq!(ttl.top_assets, Duration::from_secs(300));
        assert_eq!(ttl.historical_series, Duration::from_secs(600));
        assert_eq!(CacheTtl::from(&CacheConfig::default()), ttl);
    }

    #[tokio::test]
    async fn test_identical_calls_within_ttl_hit_inner_once() {
        let provider = CachingMarketDataProvider::new(MockInnerProvider::new(), CacheTtl::default());
        let inner = &provider.inner;

        let first = provider.fetch_top_assets(10).await.unwrap();
        let second = provider.fetch_top_assets(10).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.asset_calls.load(Ordering::SeqCst), 1);

        provider.fetch_historical_series("bitcoin", 7).await.unwrap();
        provider.fetch_historical_series("bitcoin", 7).await.unwrap();
        assert_eq!(inner.series_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_parameters_are_cached_separately() {
        let provider = CachingMarketDataProvider::new(MockInnerProvider::new(), CacheTtl::default());
        let inner = &provider.inner;

        assert_eq!(provider.fetch_top_assets(10).await.unwrap().len(), 10);
        assert_eq!(provider.fetch_top_assets(5).await.unwrap().len(), 5);
        assert_eq!(inner.asset_calls.load(Ordering::SeqCst), 2);

        provider.fetch_historical_series("bitcoin", 7).await.unwrap();
        provider.fetch_historical_series("bitcoin", 30).await.unwrap();
        let eth = provider.fetch_historical_series("ethereum", 7).await.unwrap();
        assert_eq!(eth.asset_id, "ethereum");
        assert_eq!(inner.series_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let provider = CachingMarketDataProvider::new(MockInnerProvider::new(), short_ttl());
        let inner = &provider.inner;

        provider.fetch_top_assets(3).await.unwrap();
        provider.fetch_historical_series("bitcoin", 7).await.unwrap();

        sleep(Duration::from_millis(60)).await;

        provider.fetch_top_assets(3).await.unwrap();
        provider.fetch_historical_series("bitcoin", 7).await.unwrap();
        assert_eq!(inner.asset_calls.load(Ordering::SeqCst), 2);
        assert_eq!(inner.series_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let provider = CachingMarketDataProvider::new(MockInnerProvider::new(), CacheTtl::default());
        let inner = &provider.inner;
        inner.failing.store(true, Ordering::SeqCst);

        assert!(provider.fetch_top_assets(3).await.is_err());
        assert!(provider.fetch_historical_series("bitcoin", 7).await.is_err());

        inner.failing.store(false, Ordering::SeqCst);
        assert_eq!(provider.fetch_top_assets(3).await.unwrap().len(), 3);
        assert!(provider.fetch_historical_series("bitcoin", 7).await.is_ok());
        assert_eq!(inner.asset_calls.load(Ordering::SeqCst), 2);
        assert_eq!(inner.series_calls.load(Ordering::SeqCst), 2);

        // And the successful results are now served from the cache
        provider.fetch_top_assets(3).await.unwrap();
        assert_eq!(inner.asset_calls.load(Ordering::SeqCst), 2);
    }
}
