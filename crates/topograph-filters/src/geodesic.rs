//! Geodesic-distance filters. Both run one single-source pass per node;
//! sources are sharded across the rayon pool since every pass only reads
//! the graph.

use crate::FilterValues;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use topograph_graph::FilterGraph;

struct HeapEntry {
    dist: f64,
    node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.node == other.node
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Weighted single-source shortest paths; unreachable nodes stay at
/// `f64::INFINITY`.
pub(crate) fn shortest_paths(graph: &FilterGraph, source: usize) -> Vec<f64> {
    let mut dist = vec![f64::INFINITY; graph.node_count()];
    let mut heap = BinaryHeap::new();
    dist[source] = 0.0;
    heap.push(HeapEntry {
        dist: 0.0,
        node: source,
    });
    while let Some(HeapEntry { dist: d, node: u }) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for &(v, w) in graph.neighbors(u) {
            let next = d + w;
            if next < dist[v] {
                dist[v] = next;
                heap.push(HeapEntry { dist: next, node: v });
            }
        }
    }
    dist
}

/// Unweighted hop distances from one source.
fn hop_distances(graph: &FilterGraph, source: usize) -> Vec<usize> {
    let mut dist = vec![usize::MAX; graph.node_count()];
    let mut queue = VecDeque::from([source]);
    dist[source] = 0;
    while let Some(u) = queue.pop_front() {
        for &(v, _) in graph.neighbors(u) {
            if dist[v] == usize::MAX {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
        }
    }
    dist
}

/// Mean weighted geodesic distance from each node to every other reachable
/// node. Singleton graphs get 0.0.
pub fn average_geodesic_distance(graph: &FilterGraph) -> FilterValues {
    let n = graph.node_count();
    (0..n)
        .into_par_iter()
        .map(|source| {
            let dist = shortest_paths(graph, source);
            let (sum, reachable) = dist
                .iter()
                .enumerate()
                .filter(|&(v, d)| v != source && d.is_finite())
                .fold((0.0, 0usize), |(s, c), (_, d)| (s + d, c + 1));
            let mean = if reachable == 0 {
                0.0
            } else {
                sum / reachable as f64
            };
            (graph.node_id(source).to_string(), mean)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Hop-count eccentricity: the greatest unweighted distance from each node
/// to any reachable node.
pub fn eccentricity(graph: &FilterGraph) -> FilterValues {
    let n = graph.node_count();
    (0..n)
        .into_par_iter()
        .map(|source| {
            let ecc = hop_distances(graph, source)
                .into_iter()
                .filter(|&d| d != usize::MAX)
                .max()
                .unwrap_or(0);
            (graph.node_id(source).to_string(), ecc as f64)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn path_graph() -> FilterGraph {
        // a - b - c - d
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("b", "c", None);
        g.add_edge("c", "d", None);
        g
    }

    #[test]
    fn eccentricity_on_a_path() {
        let values = eccentricity(&path_graph());
        assert_relative_eq!(values["a"], 3.0);
        assert_relative_eq!(values["b"], 2.0);
        assert_relative_eq!(values["c"], 2.0);
        assert_relative_eq!(values["d"], 3.0);
    }

    #[test]
    fn agd_on_a_path() {
        let values = average_geodesic_distance(&path_graph());
        // a: (1+2+3)/3, b: (1+1+2)/3
        assert_relative_eq!(values["a"], 2.0);
        assert_relative_eq!(values["b"], 4.0 / 3.0);
    }

    #[test]
    fn agd_respects_edge_weights() {
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", Some(2.0));
        g.add_edge("b", "c", Some(0.5));
        let values = average_geodesic_distance(&g);
        assert_relative_eq!(values["a"], (2.0 + 2.5) / 2.0);
        assert_relative_eq!(values["c"], (0.5 + 2.5) / 2.0);
    }

    #[test]
    fn singleton_scores_zero() {
        let mut g = FilterGraph::new();
        g.add_node("only");
        assert_relative_eq!(average_geodesic_distance(&g)["only"], 0.0);
        assert_relative_eq!(eccentricity(&g)["only"], 0.0);
    }
}
