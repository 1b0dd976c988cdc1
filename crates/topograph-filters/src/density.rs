use crate::geodesic::shortest_paths;
use crate::FilterValues;
use rayon::prelude::*;
use topograph_graph::FilterGraph;

/// Gaussian kernel density over geodesic distances:
/// `den(v) = sum_u exp(-d(v,u)^2 / eps)`, unreachable nodes contributing
/// nothing. Nodes in tightly knit regions score high.
pub fn density(graph: &FilterGraph, eps: f64) -> FilterValues {
    let n = graph.node_count();
    (0..n)
        .into_par_iter()
        .map(|source| {
            let score: f64 = shortest_paths(graph, source)
                .into_iter()
                .filter(|d| d.is_finite())
                .map(|d| (-d * d / eps).exp())
                .sum();
            (graph.node_id(source).to_string(), score)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_of_a_path_is_densest() {
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("b", "c", None);
        g.add_edge("c", "d", None);
        g.add_edge("d", "e", None);
        let values = density(&g, 0.5);
        assert!(values["c"] > values["a"]);
        assert!(values["c"] > values["e"]);
    }

    #[test]
    fn singleton_scores_its_own_kernel() {
        let mut g = FilterGraph::new();
        g.add_node("only");
        assert_relative_eq!(density(&g, 0.5)["only"], 1.0);
    }
}
