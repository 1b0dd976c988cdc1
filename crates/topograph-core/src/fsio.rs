//! Single-shot artifact writes. Every on-disk artifact in the pipeline is
//! either absent or complete: content is staged to a sibling temp file and
//! renamed into place, so "file exists" is a reliable completion predicate.

use crate::{Result, TopographError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn staging_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            TopographError::InvalidOperation(format!("not a writable path: {}", path.display()))
        })?;
    Ok(path.with_file_name(format!("{}.tmp", name)))
}

pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let staged = staging_path(path)?;
    fs::write(&staged, bytes)?;
    fs::rename(&staged, path)?;
    debug!("wrote {}", path.display());
    Ok(())
}

pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    atomic_write_bytes(path, &bytes)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.json");

        let mut data = BTreeMap::new();
        data.insert("n0".to_string(), 0.5f64);
        atomic_write_json(&path, &data).unwrap();

        let back: BTreeMap<String, f64> = read_json(&path).unwrap();
        assert_eq!(back, data);
        // no staging residue
        assert!(!path.with_file_name("artifact.json.tmp").exists());
    }

    #[test]
    fn overwrite_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.json");
        atomic_write_bytes(&path, b"{\"long\":\"first version with padding\"}").unwrap();
        atomic_write_bytes(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }
}
