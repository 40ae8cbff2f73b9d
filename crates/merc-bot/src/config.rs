//! Application configuration.

use crate::error::{AppError, AppResult};
use merc_feed::FeedConfig;
use merc_pricelist::PricelistConfig;
use serde::{Deserialize, Serialize};

fn default_pricer_url() -> String {
    "https://api.prices.tf".to_string()
}

fn default_schema_path() -> String {
    "config/schema.json".to_string()
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the pricer REST API.
    #[serde(default = "default_pricer_url")]
    pub pricer_url: String,

    /// Path to the item-schema JSON file.
    #[serde(default = "default_schema_path")]
    pub schema_path: String,

    /// Engine configuration.
    #[serde(default)]
    pub pricelist: PricelistConfig,

    /// Live feed configuration.
    #[serde(default)]
    pub feed: FeedConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricer_url: default_pricer_url(),
            schema_path: default_schema_path(),
            pricelist: PricelistConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, with `MERC_*` environment
    /// variables layered on top (e.g. `MERC_PRICER_URL`,
    /// `MERC_PRICELIST__MAX_AGE_SECS`).
    pub fn load(path: &str) -> AppResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MERC").separator("__"))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Interval of the periodic stale-price refresh: half the max age,
    /// never below five minutes.
    pub fn refresh_interval(&self) -> std::time::Duration {
        let half_age = self.pricelist.max_age_secs.max(0) as u64 / 2;
        std::time::Duration::from_secs(half_age.max(300))
    }
}
