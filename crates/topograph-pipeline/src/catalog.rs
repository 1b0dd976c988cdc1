//! Dataset catalog scanner: a read-only filesystem walk over the fixed
//! bucket set, recording which datafiles have which computed filter
//! functions. The scan runs on demand and the result is passed around by
//! value; new background artifacts only become visible on an explicit
//! re-scan.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use topograph_core::{Bucket, DatasetCatalog, FILTER_FUNCTIONS};
use tracing::{debug, warn};

pub fn scan(data_root: &Path) -> DatasetCatalog {
    let mut catalog = DatasetCatalog::default();
    for bucket in Bucket::ALL {
        let dir = data_root.join(bucket.as_str());
        if !dir.is_dir() {
            continue;
        }
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("cannot read bucket {}: {}", dir.display(), err);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(datafile) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let results_dir = path.with_extension("");
            let mut functions = BTreeMap::new();
            for &(id, display) in FILTER_FUNCTIONS {
                if results_dir.join(format!("{}.json", id)).exists() {
                    functions.insert(id.to_string(), display.to_string());
                }
            }
            if functions.is_empty() {
                debug!("{} has no computed filter functions, omitted", datafile);
                continue;
            }
            catalog.insert(bucket, datafile.to_string(), functions);
        }
    }
    catalog
}
