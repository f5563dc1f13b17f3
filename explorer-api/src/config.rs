//! Persisted service configuration, loaded through confy.

use std::time::Duration;

use explorer_governance::TallyConfig;
use explorer_store::StoreConfig;
use explorer_types::Network;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const APP_NAME: &str = "dao-explorer";
pub const CONFIG_NAME: &str = "api-config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub listen_addr: String,
    pub store_path: String,
    /// JSON snapshot imported into the store before serving.
    pub snapshot_path: Option<String>,
    pub networks: Vec<Network>,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub tally: TallyConfig,
    pub store: StoreConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            store_path: "explorer-db".to_string(),
            snapshot_path: None,
            networks: Network::ALL.to_vec(),
            cache_ttl_secs: 60,
            cache_capacity: 1_024,
            tally: TallyConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load the stored configuration, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = confy::get_configuration_file_path(APP_NAME, CONFIG_NAME) {
            info!("Configuration file path: {:?}", path);
        }
        match confy::load(APP_NAME, CONFIG_NAME) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Failed to load configuration: {:?}. Using default.", e);
                ApiConfig::default()
            }
        }
    }

    pub fn save(&self) {
        match confy::store(APP_NAME, CONFIG_NAME, self) {
            Ok(_) => info!("Configuration stored."),
            Err(e) => error!("Failed to store configuration: {:?}", e),
        }
    }

    /// Reject settings under which a valid window could overflow the
    /// store's bucket limit.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.store.fits_partition_ceiling(self.tally.partition_ceiling),
            "store.max_buckets {} leaves no headroom over tally.partition_ceiling {}",
            self.store.max_buckets,
            self.tally.partition_ceiling
        );
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
