//! Deterministic cache paths. A derived artifact is addressed by
//! (kind, bucket, datafile, parameter set); the parameter suffix is
//! concatenated in lexicographic key order, so identical parameter sets
//! always produce the identical path no matter how the caller assembled
//! them. That ordering is the entire correctness argument for cache-key
//! stability.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use topograph_core::{ArtifactKind, Result};

/// Parameter set for one cache key. `BTreeMap` keeps the keys sorted,
/// making the suffix order structural rather than caller-supplied.
pub type CacheParams = BTreeMap<String, String>;

/// Builds `root/bucket/datafile/kind{_value}*.json`, creating intermediate
/// directories on demand. Directory-already-exists is not an error, which
/// also makes concurrent creation by racing requests benign.
pub fn cache_path(
    root: &Path,
    kind: ArtifactKind,
    bucket: &str,
    datafile: &str,
    params: &CacheParams,
) -> Result<PathBuf> {
    let dir = root.join(bucket).join(datafile);
    fs::create_dir_all(&dir)?;

    let mut name = kind.as_str().to_string();
    for value in params.values() {
        name.push('_');
        name.push_str(value);
    }
    name.push_str(".json");
    Ok(dir.join(name))
}
