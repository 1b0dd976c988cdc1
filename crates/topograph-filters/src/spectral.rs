//! Spectral filters over the graph Laplacian. The smallest eigenpairs are
//! found by power iteration on the spectrally shifted matrix `cI - L`
//! (largest eigenvalues of the shift are the smallest of `L`), deflating
//! each converged eigenvector out of the next search. The Laplacian is kept
//! in compressed sparse rows so one iteration costs O(edges).

use crate::{EigenOutcome, FilterOutcome, FilterValues};
use ndarray::Array1;
use topograph_graph::FilterGraph;
use tracing::debug;

const TOLERANCE: f64 = 1e-10;
const MAX_ITERATIONS: usize = 5000;

pub(crate) struct CsrMatrix {
    n: usize,
    row_ptr: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
}

impl CsrMatrix {
    fn from_rows(rows: Vec<Vec<(usize, f64)>>) -> Self {
        let n = rows.len();
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut cols = Vec::new();
        let mut vals = Vec::new();
        row_ptr.push(0);
        for row in rows {
            for (col, val) in row {
                cols.push(col);
                vals.push(val);
            }
            row_ptr.push(cols.len());
        }
        Self {
            n,
            row_ptr,
            cols,
            vals,
        }
    }

    fn matvec(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(self.n);
        for row in 0..self.n {
            let mut acc = 0.0;
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                acc += self.vals[k] * x[self.cols[k]];
            }
            y[row] = acc;
        }
        y
    }

    /// Gershgorin upper bound on the spectrum.
    fn spectral_bound(&self) -> f64 {
        let mut bound: f64 = 0.0;
        for row in 0..self.n {
            let radius: f64 = (self.row_ptr[row]..self.row_ptr[row + 1])
                .map(|k| self.vals[k].abs())
                .sum();
            bound = bound.max(radius);
        }
        bound
    }
}

/// Graph Laplacian `D - A`, or the symmetric normalized form
/// `I - D^{-1/2} A D^{-1/2}`. Parallel edges accumulate their weights.
pub(crate) fn laplacian(graph: &FilterGraph, normalized: bool) -> CsrMatrix {
    let n = graph.node_count();
    let degrees: Vec<f64> = (0..n).map(|u| graph.weighted_degree(u)).collect();
    let mut rows: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);
    for u in 0..n {
        let mut off: std::collections::BTreeMap<usize, f64> = std::collections::BTreeMap::new();
        for &(v, w) in graph.neighbors(u) {
            if v != u {
                *off.entry(v).or_insert(0.0) += w;
            }
        }
        let mut row = Vec::with_capacity(off.len() + 1);
        if normalized {
            row.push((u, if degrees[u] > 0.0 { 1.0 } else { 0.0 }));
            for (v, w) in off {
                let scale = (degrees[u] * degrees[v]).sqrt();
                if scale > 0.0 {
                    row.push((v, -w / scale));
                }
            }
        } else {
            row.push((u, off.values().sum::<f64>()));
            for (v, w) in off {
                row.push((v, -w));
            }
        }
        row.sort_by_key(|&(col, _)| col);
        rows.push(row);
    }
    CsrMatrix::from_rows(rows)
}

fn seeded_vector(n: usize, seed: u64) -> Array1<f64> {
    // deterministic LCG so identical inputs always converge to identical
    // eigenvectors (up to sign)
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        })
        .collect()
}

fn orthogonalize(v: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for b in basis {
        let proj = v.dot(b);
        v.scaled_add(-proj, b);
    }
}

/// Eigenpairs of `l` with the `k` smallest eigenvalues, ascending.
pub(crate) fn smallest_eigenpairs(l: &CsrMatrix, k: usize) -> Vec<(f64, Array1<f64>)> {
    let n = l.n;
    let k = k.min(n);
    let shift = l.spectral_bound() + 1.0;
    let mut pairs: Vec<(f64, Array1<f64>)> = Vec::with_capacity(k);

    for j in 0..k {
        let basis: Vec<Array1<f64>> = pairs.iter().map(|(_, v)| v.clone()).collect();
        let mut v = seeded_vector(n, j as u64 + 1);
        orthogonalize(&mut v, &basis);
        let norm = v.dot(&v).sqrt();
        if norm < 1e-12 {
            v = Array1::from_elem(n, 0.0);
            v[j % n] = 1.0;
            orthogonalize(&mut v, &basis);
        }
        let norm = v.dot(&v).sqrt();
        if norm < 1e-12 {
            break;
        }
        v.mapv_inplace(|x| x / norm);

        for iteration in 0..MAX_ITERATIONS {
            // w = (shift*I - L) v
            let mut w = l.matvec(&v);
            w.zip_mut_with(&v, |wi, &vi| *wi = shift * vi - *wi);
            orthogonalize(&mut w, &basis);
            let norm = w.dot(&w).sqrt();
            if norm < 1e-12 {
                break;
            }
            w.mapv_inplace(|x| x / norm);

            // converged when w matches v up to sign
            let same: f64 = (&w - &v).iter().map(|d| d * d).sum::<f64>().sqrt();
            let flipped: f64 = (&w + &v).iter().map(|d| d * d).sum::<f64>().sqrt();
            v = w;
            if same.min(flipped) < TOLERANCE {
                debug!(pair = j, iteration, "eigenpair converged");
                break;
            }
        }

        let eigenvalue = v.dot(&l.matvec(&v));
        pairs.push((eigenvalue, v));
    }

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs
}

fn vector_to_values(graph: &FilterGraph, v: &Array1<f64>) -> FilterValues {
    (0..graph.node_count())
        .map(|idx| (graph.node_id(idx).to_string(), v[idx]))
        .collect()
}

/// Second-smallest Laplacian eigenvector. Only defined on connected graphs;
/// disconnected input is a structural skip, not an error.
pub fn fiedler_vector(graph: &FilterGraph, normalized: bool) -> FilterOutcome {
    if graph.node_count() < 2 {
        return FilterOutcome::Skipped {
            reason: "fewer than two nodes".into(),
        };
    }
    if !graph.is_connected() {
        return FilterOutcome::Skipped {
            reason: "graph is not connected".into(),
        };
    }
    let l = laplacian(graph, normalized);
    let pairs = smallest_eigenpairs(&l, 2);
    match pairs.get(1) {
        Some((_, v)) => FilterOutcome::Values(vector_to_values(graph, v)),
        None => FilterOutcome::Skipped {
            reason: "eigen decomposition produced fewer than two pairs".into(),
        },
    }
}

/// Eigenpairs for the smallest Laplacian eigenvalues, enough to serve eigen
/// indices 1 through 5 where the node count allows.
pub fn eigen_function(graph: &FilterGraph, normalized: bool) -> EigenOutcome {
    let n = graph.node_count();
    if n < 2 {
        return EigenOutcome::Skipped {
            reason: "fewer than two nodes".into(),
        };
    }
    let l = laplacian(graph, normalized);
    let pairs = smallest_eigenpairs(&l, n.min(6));
    EigenOutcome::Pairs(
        pairs
            .into_iter()
            .map(|(value, v)| (value, vector_to_values(graph, &v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn barbell() -> FilterGraph {
        // two triangles joined by one bridge
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("b", "c", None);
        g.add_edge("c", "a", None);
        g.add_edge("x", "y", None);
        g.add_edge("y", "z", None);
        g.add_edge("z", "x", None);
        g.add_edge("c", "x", None);
        g
    }

    #[test]
    fn smallest_eigenvalue_of_connected_laplacian_is_zero() {
        let g = barbell();
        let l = laplacian(&g, false);
        let pairs = smallest_eigenpairs(&l, 3);
        assert_relative_eq!(pairs[0].0, 0.0, epsilon = 1e-6);
        assert!(pairs[1].0 > 1e-6);
        assert!(pairs[1].0 <= pairs[2].0 + 1e-9);
    }

    #[test]
    fn fiedler_separates_the_two_clusters() {
        let g = barbell();
        let FilterOutcome::Values(values) = fiedler_vector(&g, false) else {
            panic!("expected values");
        };
        // both triangles end up on consistent sides of zero
        let side = |id: &str| values[id].signum();
        assert_eq!(side("a"), side("b"));
        assert_eq!(side("a"), side("c"));
        assert_eq!(side("x"), side("y"));
        assert_eq!(side("x"), side("z"));
        assert_ne!(side("a"), side("x"));
    }

    #[test]
    fn fiedler_declines_disconnected_graphs() {
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("c", "d", None);
        assert!(matches!(
            fiedler_vector(&g, false),
            FilterOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn eigen_function_declines_tiny_graphs() {
        let mut g = FilterGraph::new();
        g.add_node("only");
        assert!(matches!(
            eigen_function(&g, false),
            EigenOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn eigen_pair_count_is_capped_by_node_count() {
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("b", "c", None);
        let EigenOutcome::Pairs(pairs) = eigen_function(&g, false) else {
            panic!("expected pairs");
        };
        assert_eq!(pairs.len(), 3);
        let values: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1] + 1e-9));
    }

    #[test]
    fn normalized_spectrum_stays_below_two() {
        let g = barbell();
        let l = laplacian(&g, true);
        let pairs = smallest_eigenpairs(&l, 6);
        for (value, _) in pairs {
            assert!(value >= -1e-9 && value <= 2.0 + 1e-9);
        }
    }
}
