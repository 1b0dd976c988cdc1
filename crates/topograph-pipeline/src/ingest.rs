//! Dataset classifier and ingestor: raw input -> canonical bucketed graph.
//! A raw source maps to at most one canonical graph; the identity check is
//! file existence under any bucket, so bucketing is decided exactly once,
//! at first ingestion.

use crate::scheduler;
use std::fs;
use std::path::{Path, PathBuf};
use topograph_core::{Bucket, Result, Settings, TopographError};
use topograph_graph::{write_node_link_graph, DecoderRegistry};
use tracing::{debug, info, warn};

pub struct Ingestor {
    data_root: PathBuf,
    registry: DecoderRegistry,
}

impl Ingestor {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            registry: DecoderRegistry::new(),
        }
    }

    /// Creates the four bucket directories; existing ones are left alone.
    pub fn ensure_bucket_dirs(&self) -> Result<()> {
        for bucket in Bucket::ALL {
            fs::create_dir_all(self.data_root.join(bucket.as_str()))?;
        }
        Ok(())
    }

    fn canonical_name(raw: &Path) -> Option<(String, String)> {
        let base = raw.file_stem()?.to_str()?.to_ascii_lowercase();
        let ext = raw.extension()?.to_str()?.to_ascii_lowercase();
        Some((base, ext))
    }

    /// Ingests one raw graph file. Returns the canonical path, or `None`
    /// when the extension is unsupported (a skip, not an error).
    pub fn ingest(&self, raw: &Path) -> Result<Option<PathBuf>> {
        info!("found graph: {}", raw.display());
        let Some((base, ext)) = Self::canonical_name(raw) else {
            debug!("skipping {}: no usable name", raw.display());
            return Ok(None);
        };
        let Some(decoder) = self.registry.decoder_for(&ext) else {
            debug!("skipping {}: unsupported extension", raw.display());
            return Ok(None);
        };

        // one raw source -> at most one canonical graph, wherever it was
        // filed on first sight
        for bucket in Bucket::ALL {
            let existing = self
                .data_root
                .join(bucket.as_str())
                .join(format!("{}.json", base));
            if existing.exists() {
                debug!("{} already canonical at {}", base, existing.display());
                return Ok(Some(existing));
            }
        }

        let decoded = decoder.decode(raw)?;
        let gcc = decoded.greatest_connected_component();
        if gcc.is_empty() {
            return Err(TopographError::Graph(format!(
                "{} decoded to an empty graph",
                raw.display()
            )));
        }
        let reduced = decoded.induced_subgraph(&gcc);
        let bucket = Bucket::for_node_count(reduced.node_count());
        let out = self
            .data_root
            .join(bucket.as_str())
            .join(format!("{}.json", base));

        info!(
            "converting {} ({} of {} nodes) into {}",
            raw.display(),
            reduced.node_count(),
            decoded.node_count(),
            out.display()
        );
        write_node_link_graph(&out, &reduced)?;
        Ok(Some(out))
    }
}

/// Walks one directory level below `source_dir` (one collection per
/// subdirectory) and ingests every file found. Per-file failures are
/// logged and skipped; the sweep always continues.
pub fn sweep_sources(source_dir: &Path, ingestor: &Ingestor) -> Vec<PathBuf> {
    let mut canonical = Vec::new();
    let collections = match fs::read_dir(source_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot read source dir {}: {}", source_dir.display(), err);
            return canonical;
        }
    };
    for collection in collections.flatten() {
        let path = collection.path();
        if !path.is_dir() {
            continue;
        }
        let files = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("cannot read collection {}: {}", path.display(), err);
                continue;
            }
        };
        for file in files.flatten() {
            let raw = file.path();
            if !raw.is_file() {
                continue;
            }
            match ingestor.ingest(&raw) {
                Ok(Some(out)) => canonical.push(out),
                Ok(None) => {}
                Err(err) => warn!("{} failed: {}", raw.display(), err),
            }
        }
    }
    canonical
}

/// Full data-generation pass: ingest every raw source, then run the
/// filter-function batch over each canonical graph under the configured
/// per-datafile time budget.
pub fn generate_data(settings: &Settings) -> Result<()> {
    let ingestor = Ingestor::new(&settings.storage.data_dir);
    ingestor.ensure_bucket_dirs()?;
    let canonical = sweep_sources(&settings.storage.source_dir, &ingestor);
    info!("{} canonical graphs to process", canonical.len());
    for path in canonical {
        if let Err(err) = scheduler::run_batch(&path, settings.time_budget()) {
            warn!("batch for {} failed: {}", path.display(), err);
        }
    }
    Ok(())
}
