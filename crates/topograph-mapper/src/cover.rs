use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One closed interval of a cover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverInterval {
    pub lo: f64,
    pub hi: f64,
}

impl CoverInterval {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

/// Uniform overlapping cover of a filter function's value range: `n`
/// base intervals, each widened on both sides by `overlap` as a fraction
/// of the base interval length. Neighboring intervals therefore share
/// their boundary regions, which is what makes summary-graph links exist.
#[derive(Debug, Clone)]
pub struct Cover {
    intervals: Vec<CoverInterval>,
}

impl Cover {
    pub fn new(values: &BTreeMap<String, f64>, n: usize, overlap: f64) -> Self {
        let n = n.max(1);
        let (min, max) = values.values().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        if !min.is_finite() {
            return Self { intervals: Vec::new() };
        }
        let step = (max - min) / n as f64;
        let margin = step * overlap / 2.0;
        let intervals = (0..n)
            .map(|i| CoverInterval {
                lo: min + i as f64 * step - margin,
                hi: min + (i + 1) as f64 * step + margin,
            })
            .collect();
        Self { intervals }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoverInterval> {
        self.intervals.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn values() -> BTreeMap<String, f64> {
        [("a", 0.0), ("b", 0.5), ("c", 1.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn covers_the_whole_range() {
        let cover = Cover::new(&values(), 4, 0.2);
        assert_eq!(cover.len(), 4);
        let first = cover.iter().next().unwrap();
        let last = cover.iter().last().unwrap();
        assert!(first.contains(0.0));
        assert!(last.contains(1.0));
    }

    #[test]
    fn neighboring_intervals_overlap() {
        let cover = Cover::new(&values(), 2, 0.5);
        let intervals: Vec<&CoverInterval> = cover.iter().collect();
        assert!(intervals[0].hi > intervals[1].lo);
        assert_relative_eq!(intervals[0].hi - intervals[1].lo, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn empty_values_give_an_empty_cover() {
        let cover = Cover::new(&BTreeMap::new(), 3, 0.2);
        assert!(cover.is_empty());
    }
}
