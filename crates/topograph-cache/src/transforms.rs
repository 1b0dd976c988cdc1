//! Presentation transforms for filter-function values. Both rescale into
//! [0, 1] for the client's color maps; neither touches the stored artifact.

use std::collections::BTreeMap;
use std::path::Path;
use topograph_core::{read_json, FilterResult, Result};

/// Min-max rescaling. A constant map widens the denominator by one instead
/// of dividing by zero, so every key still gets a small finite value.
pub fn min_max_normalize(mut values: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let (min, max) = values
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return values;
    }
    let mut denom = max - min;
    if denom == 0.0 {
        denom += 1.0;
    }
    for v in values.values_mut() {
        *v = (*v - min) / denom;
    }
    values
}

/// Rank rescaling: keys sorted ascending by value get `rank / (n - 1)`,
/// 0.0 for the smallest through 1.0 for the largest. The sort is stable,
/// so equal values keep their key order.
pub fn rank_normalize(values: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let n = values.len();
    if n <= 1 {
        return values.into_iter().map(|(k, _)| (k, 0.0)).collect();
    }
    let mut entries: Vec<(String, f64)> = values.into_iter().collect();
    entries.sort_by(|a, b| a.1.total_cmp(&b.1));
    entries
        .into_iter()
        .enumerate()
        .map(|(rank, (key, _))| (key, rank as f64 / (n - 1) as f64))
        .collect()
}

/// Loads a computed filter function from the data tree and applies the
/// requested presentation transform.
pub fn load_filter_values(
    data_root: &Path,
    bucket: &str,
    datafile: &str,
    filter_id: &str,
    ranked: bool,
) -> Result<BTreeMap<String, f64>> {
    let stem = Path::new(datafile)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(datafile);
    let path = data_root
        .join(bucket)
        .join(stem)
        .join(format!("{}.json", filter_id));
    let result: FilterResult = read_json(&path)?;
    Ok(if ranked {
        rank_normalize(result.data)
    } else {
        min_max_normalize(result.data)
    })
}
