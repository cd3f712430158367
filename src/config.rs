//! Walker configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults,
//! an optional YAML file, then command-line flags (see [`crate::cli`]).
//!
//! ```yaml
//! reference: thepaypers
//! listing_url: https://thepaypers.com/news/all
//! wait_timeout_secs: 20
//! page_pause_ms: 3000
//! restrictions:
//!   from_date: "2024-08-01T00:00:00"
//!   maximum_materials: 200
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

use crate::error::Result;
use crate::restrictions::RestrictionsConfig;
use crate::scrapers::WalkerSettings;
use crate::scrapers::thepaypers::LISTING_URL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Unique name of the source.
    pub reference: String,
    pub listing_url: String,
    /// Bound on waits for the listing and article containers.
    pub wait_timeout_secs: u64,
    /// Pause after clicking through to the next listing page.
    pub page_pause_ms: u64,
    /// Delay between presence checks during a wait.
    pub poll_interval_ms: u64,
    pub user_agent: String,
    pub restrictions: RestrictionsConfig,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            reference: "thepaypers".to_string(),
            listing_url: LISTING_URL.to_string(),
            wait_timeout_secs: 20,
            page_pause_ms: 3000,
            poll_interval_ms: 500,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            restrictions: RestrictionsConfig {
                from_date: NaiveDate::from_ymd_opt(2024, 8, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
                ..Default::default()
            },
        }
    }
}

impl WalkerConfig {
    /// Load a YAML file; keys it leaves out keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: WalkerConfig = serde_yaml::from_str(&raw)?;
        info!(reference = %config.reference, "Loaded configuration");
        Ok(config)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn walker_settings(&self) -> Result<WalkerSettings> {
        let listing_url = Url::parse(&self.listing_url)?;
        Ok(WalkerSettings::new(listing_url)
            .with_wait_timeout(self.wait_timeout())
            .with_page_pause(self.page_pause()))
    }
}
