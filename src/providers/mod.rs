pub mod caching;
pub mod coingecko;

pub use caching::{CacheTtl, CachingMarketDataProvider};
pub use coingecko::CoinGeckoProvider;
