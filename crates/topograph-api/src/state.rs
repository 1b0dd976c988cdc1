use std::sync::Arc;
use tokio::sync::RwLock;
use topograph_core::{DatasetCatalog, Settings};
use topograph_pipeline::catalog;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Catalog built by the startup scan. Later background computation is
    /// only observed after an explicit re-scan.
    pub catalog: Arc<RwLock<DatasetCatalog>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let catalog = catalog::scan(&settings.storage.data_dir);
        Self {
            settings: Arc::new(settings),
            catalog: Arc::new(RwLock::new(catalog)),
        }
    }

    pub async fn rescan(&self) -> DatasetCatalog {
        let fresh = catalog::scan(&self.settings.storage.data_dir);
        let mut guard = self.catalog.write().await;
        *guard = fresh.clone();
        fresh
    }
}
