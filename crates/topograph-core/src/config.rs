use crate::Result;
use config as cfg;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the canonical graph tree (`data/{bucket}/{datafile}.json`).
    pub data_dir: PathBuf,
    /// Root of the derived request-time artifact tree.
    pub cache_dir: PathBuf,
    /// Directory swept for raw input graphs, one collection per subdirectory.
    pub source_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".into(),
            cache_dir: "cache".into(),
            source_dir: "data/source".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Shared wall-clock budget for one datafile's filter-function batch.
    pub time_budget_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Settings {
    /// Layered load: optional `topograph.toml` in the working directory,
    /// overridden by `TOPOGRAPH_`-prefixed environment variables
    /// (e.g. `TOPOGRAPH_SERVER__PORT=8080`).
    pub fn load() -> Result<Self> {
        let settings = cfg::Config::builder()
            .add_source(cfg::File::with_name("topograph").required(false))
            .add_source(cfg::Environment::with_prefix("TOPOGRAPH").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.batch.time_budget_secs)
    }
}
