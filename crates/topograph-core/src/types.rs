use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Size class a canonical graph is filed under, decided once at first
/// ingestion from the post-reduction node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Small,
        Bucket::Medium,
        Bucket::Large,
        Bucket::VeryLarge,
    ];

    pub fn for_node_count(count: usize) -> Self {
        if count < 100 {
            Bucket::Small
        } else if count < 1000 {
            Bucket::Medium
        } else if count < 5000 {
            Bucket::Large
        } else {
            Bucket::VeryLarge
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Small => "small",
            Bucket::Medium => "medium",
            Bucket::Large => "large",
            Bucket::VeryLarge => "very_large",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Bucket::Small),
            "medium" => Ok(Bucket::Medium),
            "large" => Ok(Bucket::Large),
            "very_large" => Ok(Bucket::VeryLarge),
            other => Err(format!("unknown bucket: {}", other)),
        }
    }
}

/// Derived artifact families stored under the request-time cache tree.
/// Canonical graphs live under the `data/` tree and are addressed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    GraphLayout,
    SummaryGraph,
    SummaryLayout,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::GraphLayout => "graph_layout",
            ArtifactKind::SummaryGraph => "summary_graph",
            ArtifactKind::SummaryLayout => "summary_layout",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed filter-function artifact ids and their display names, in batch
/// emission order. One artifact file per id under each datafile's derived
/// results directory.
pub const FILTER_FUNCTIONS: &[(&str, &str)] = &[
    ("agd", "Average Geodesic Distance"),
    ("ecc", "Eccentricity"),
    ("pr_0_85", "PageRank (alpha=0.85)"),
    ("fv", "Fiedler Vector"),
    ("fv_norm", "Fiedler Vector Normalized"),
    ("den_0_5", "Density 0.5"),
    ("ev_1", "Eigen Function (2nd)"),
    ("ev_2", "Eigen Function (3rd)"),
    ("ev_3", "Eigen Function (4th)"),
    ("ev_4", "Eigen Function (5th)"),
    ("ev_5", "Eigen Function (6th)"),
    ("ev_norm_1", "Eigen Function Normalized (2nd)"),
    ("ev_norm_2", "Eigen Function Normalized (3rd)"),
    ("ev_norm_3", "Eigen Function Normalized (4th)"),
    ("ev_norm_4", "Eigen Function Normalized (5th)"),
    ("ev_norm_5", "Eigen Function Normalized (6th)"),
];

static FILTER_DISPLAY_NAMES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FILTER_FUNCTIONS.iter().copied().collect());

pub fn filter_display_name(id: &str) -> Option<&'static str> {
    FILTER_DISPLAY_NAMES.get(id).copied()
}

/// A computed filter function as persisted on disk: one file per
/// (graph, filter id, parameter set). `parameters` carries the task-specific
/// fields (`alpha`, `eps`, `eigen`, `normalized`) flattened alongside the
/// fixed ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    pub name: String,
    #[serde(flatten)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub process_time: f64,
    pub data: BTreeMap<String, f64>,
}

/// Read-only index of which buckets/datafiles have which computed filter
/// functions: bucket -> datafile -> filter id -> display name.
///
/// Built by scanning the data tree; datafiles with zero computed filter
/// functions are omitted. Constructed explicitly and passed by argument,
/// never ambient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetCatalog(pub BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>);

impl DatasetCatalog {
    pub fn insert(
        &mut self,
        bucket: Bucket,
        datafile: String,
        functions: BTreeMap<String, String>,
    ) {
        self.0
            .entry(bucket.as_str().to_string())
            .or_default()
            .insert(datafile, functions);
    }

    pub fn contains_dataset(&self, bucket: &str) -> bool {
        self.0.contains_key(bucket)
    }

    pub fn contains_datafile(&self, bucket: &str, datafile: &str) -> bool {
        self.0
            .get(bucket)
            .map_or(false, |files| files.contains_key(datafile))
    }

    pub fn contains_filter(&self, bucket: &str, datafile: &str, filter_id: &str) -> bool {
        self.0
            .get(bucket)
            .and_then(|files| files.get(datafile))
            .map_or(false, |functions| functions.contains_key(filter_id))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
