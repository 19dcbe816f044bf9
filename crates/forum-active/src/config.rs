use std::path::Path;

use eyre::Result;
use serde::{Deserialize, Serialize};

use forum_rank::RankerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    refresh_interval_minutes: u32,
    ranker: RankerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: 60,
            ranker: RankerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads a TOML config. A missing file means defaults everywhere.
    pub async fn from_config(config: impl AsRef<Path>) -> Result<Self> {
        let config = config.as_ref();
        let data = match tokio::fs::read(config).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Config {} not found, using defaults", config.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = toml::from_slice::<AppConfig>(&data)?;
        Ok(config)
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.refresh_interval_minutes.max(1)) * 60)
    }

    pub fn ranker(&self) -> &RankerConfig {
        &self.ranker
    }

    pub fn into_ranker(self) -> RankerConfig {
        self.ranker
    }
}
