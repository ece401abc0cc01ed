//! Engine configuration, loadable from YAML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sync::DEFAULT_VIEW_DEPTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tunables for a colony session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Fog-of-war expansion depth in hex steps.
    pub view_depth: u32,
    /// Tile cache entry lifetime in seconds.
    pub cache_ttl_secs: u64,
    /// Debug flag: treat every tile update as viewable regardless of state.
    pub show_all_tiles: bool,
    /// Maximum ids per batched network fetch.
    pub fetch_batch: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            view_depth: DEFAULT_VIEW_DEPTH,
            cache_ttl_secs: 60 * 60,
            show_all_tiles: false,
            fetch_batch: 64,
        }
    }
}

impl SyncConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<SyncConfig, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<SyncConfig, ConfigError> {
        SyncConfig::from_yaml_str(&std::fs::read_to_string(path)?)
    }
}
