//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod forecast;
pub mod log;
pub mod market;
pub mod ranking;

// Re-export main types for cleaner imports
pub use forecast::{ArimaModel, ArimaOrder, ForecastStep};
pub use market::{AssetSnapshot, HistoricalSeries, MarketDataError, MarketDataProvider, PricePoint};
