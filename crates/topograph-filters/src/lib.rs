//! Filter-function library: pure functions assigning one scalar per graph
//! node. All functions take the graph read-only and return maps keyed by
//! node id. The spectral functions can decline structurally unsuitable
//! inputs; they report that as a tagged outcome rather than an error so
//! callers can treat it as "no artifact" without aborting siblings.

pub mod density;
pub mod geodesic;
pub mod pagerank;
pub mod spectral;

use std::collections::BTreeMap;

pub use density::density;
pub use geodesic::{average_geodesic_distance, eccentricity};
pub use pagerank::pagerank;
pub use spectral::{eigen_function, fiedler_vector};

pub type FilterValues = BTreeMap<String, f64>;

/// Outcome of a filter function that can decline its input.
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    Values(FilterValues),
    Skipped { reason: String },
}

/// Outcome of the eigen-function family: eigenpairs ordered by ascending
/// eigenvalue, each eigenvector keyed by node id.
#[derive(Debug, Clone)]
pub enum EigenOutcome {
    Pairs(Vec<(f64, FilterValues)>),
    Skipped { reason: String },
}
