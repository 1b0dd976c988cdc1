pub mod config;
pub mod error;
pub mod fsio;
pub mod types;

pub use config::{BatchConfig, ServerConfig, Settings, StorageConfig};
pub use error::{Result, TopographError};
pub use fsio::{atomic_write_bytes, atomic_write_json, read_json};
pub use types::{
    filter_display_name, ArtifactKind, Bucket, DatasetCatalog, FilterResult, FILTER_FUNCTIONS,
};
