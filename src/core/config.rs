use crate::core::forecast::ArimaOrder;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
    /// Demo API key, sent as `x-cg-demo-api-key` when present.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CoinGeckoProviderConfig {
    fn default() -> Self {
        CoinGeckoProviderConfig {
            base_url: DEFAULT_COINGECKO_URL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub coingecko: CoinGeckoProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub top_assets_ttl_secs: u64,
    pub historical_series_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            top_assets_ttl_secs: 300,
            historical_series_ttl_secs: 600,
        }
    }
}

impl CacheConfig {
    pub fn top_assets_ttl(&self) -> Duration {
        Duration::from_secs(self.top_assets_ttl_secs)
    }

    pub fn historical_series_ttl(&self) -> Duration {
        Duration::from_secs(self.historical_series_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ForecastConfig {
    pub order: ArimaOrder,
    pub training_days: u32,
    pub confidence: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            order: ArimaOrder::default(),
            training_days: 365,
            confidence: 0.95,
        }
    }
}

fn default_top_limit() -> usize {
    100
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            top_limit: default_top_limit(),
            cache: CacheConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or the built-in defaults if
    /// no file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "coinxp", "coinxp")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
