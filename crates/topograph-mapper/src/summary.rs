//! Summary-graph ("mapper graph") construction: cluster each cover
//! interval's preimage, then link clusters that share graph nodes.

use crate::Cover;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use topograph_core::{Result, TopographError};
use topograph_graph::FilterGraph;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryNode {
    pub id: String,
    /// Index of the cover interval this cluster came from.
    pub interval: usize,
    /// Mean filter value over the cluster's member nodes.
    pub avg_value: f64,
    /// Member count, kept even when the member list is stripped.
    pub size: usize,
    /// Member graph-node ids; stripped for very large inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLink {
    pub source: String,
    pub target: String,
    /// Number of shared graph nodes.
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryGraph {
    pub nodes: Vec<SummaryNode>,
    pub links: Vec<SummaryLink>,
    pub compute_time: f64,
}

impl SummaryGraph {
    /// Builds the summary graph. `component_method` and `link_method`
    /// select the clustering and linking strategies; the connected-component
    /// and shared-node strategies are the ones implemented, anything else
    /// falls back to them with a warning.
    pub fn build(
        graph: &FilterGraph,
        values: &BTreeMap<String, f64>,
        cover: &Cover,
        component_method: &str,
        link_method: &str,
    ) -> Result<Self> {
        if !matches!(component_method, "connected_components" | "cc") {
            warn!(component_method, "unknown component method, using connected components");
        }
        if !matches!(link_method, "shared_nodes" | "shared") {
            warn!(link_method, "unknown link method, using shared nodes");
        }

        let start = Instant::now();
        let mut nodes = Vec::new();
        // graph node index -> summary node indices it belongs to
        let mut memberships: HashMap<usize, Vec<usize>> = HashMap::new();

        for (interval_idx, interval) in cover.iter().enumerate() {
            let preimage: Vec<usize> = (0..graph.node_count())
                .filter(|&idx| {
                    values
                        .get(graph.node_id(idx))
                        .map_or(false, |&v| interval.contains(v))
                })
                .collect();
            if preimage.is_empty() {
                continue;
            }
            let sub = graph.induced_subgraph(&preimage);
            for (cluster_idx, component) in sub.connected_components().into_iter().enumerate() {
                let member_ids: Vec<String> = component
                    .iter()
                    .map(|&i| sub.node_id(i).to_string())
                    .collect();
                let avg_value = member_ids
                    .iter()
                    .filter_map(|id| values.get(id))
                    .sum::<f64>()
                    / member_ids.len() as f64;

                let summary_idx = nodes.len();
                for id in &member_ids {
                    if let Some(graph_idx) = graph.index_of(id) {
                        memberships.entry(graph_idx).or_default().push(summary_idx);
                    }
                }
                nodes.push(SummaryNode {
                    id: format!("{}:{}", interval_idx, cluster_idx),
                    interval: interval_idx,
                    avg_value,
                    size: member_ids.len(),
                    components: Some(member_ids),
                });
            }
        }

        // link clusters sharing at least one graph node, weighted by the
        // shared count
        let mut shared: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for owners in memberships.values() {
            for i in 0..owners.len() {
                for j in (i + 1)..owners.len() {
                    let key = if owners[i] < owners[j] {
                        (owners[i], owners[j])
                    } else {
                        (owners[j], owners[i])
                    };
                    *shared.entry(key).or_insert(0) += 1;
                }
            }
        }
        let links = shared
            .into_iter()
            .map(|((s, t), count)| SummaryLink {
                source: nodes[s].id.clone(),
                target: nodes[t].id.clone(),
                value: count as f64,
            })
            .collect();

        let summary = Self {
            nodes,
            links,
            compute_time: start.elapsed().as_secs_f64(),
        };
        debug!(
            nodes = summary.nodes.len(),
            links = summary.links.len(),
            "summary graph built"
        );
        Ok(summary)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn compute_time(&self) -> f64 {
        self.compute_time
    }

    /// Drops member lists, keeping only cluster sizes. Applied to very
    /// large inputs before the summary is persisted.
    pub fn strip_components_from_nodes(&mut self) {
        for node in &mut self.nodes {
            node.components = None;
        }
    }

    /// Removes summary nodes smaller than `min` members, and any link
    /// touching a removed node.
    pub fn filter_by_node_size(&mut self, min: usize) {
        self.nodes.retain(|n| n.size >= min);
        let kept: std::collections::HashSet<&str> =
            self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.links
            .retain(|l| kept.contains(l.source.as_str()) && kept.contains(l.target.as_str()));
    }

    /// Reduces the summary graph to its greatest connected component.
    pub fn extract_greatest_connected_component(&mut self) {
        let mut skeleton = FilterGraph::new();
        for node in &self.nodes {
            skeleton.add_node(&node.id);
        }
        for link in &self.links {
            skeleton.add_edge(&link.source, &link.target, None);
        }
        let gcc = skeleton.greatest_connected_component();
        let kept: std::collections::HashSet<&str> =
            gcc.iter().map(|&i| skeleton.node_id(i)).collect();
        self.nodes.retain(|n| kept.contains(n.id.as_str()));
        self.links
            .retain(|l| kept.contains(l.source.as_str()) && kept.contains(l.target.as_str()));
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(TopographError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Path a-b-c-d-e-f with monotone values; two cover halves overlapping
    /// in the middle.
    fn fixture() -> (FilterGraph, BTreeMap<String, f64>) {
        let mut g = FilterGraph::new();
        let ids = ["a", "b", "c", "d", "e", "f"];
        for pair in ids.windows(2) {
            g.add_edge(pair[0], pair[1], None);
        }
        let values = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), i as f64))
            .collect();
        (g, values)
    }

    #[test]
    fn clusters_and_links_on_a_path() {
        let (g, values) = fixture();
        let cover = Cover::new(&values, 2, 0.5);
        let summary =
            SummaryGraph::build(&g, &values, &cover, "connected_components", "shared_nodes")
                .unwrap();
        // one cluster per half, linked through the shared middle
        assert_eq!(summary.node_count(), 2);
        assert_eq!(summary.links.len(), 1);
        assert!(summary.links[0].value >= 1.0);
    }

    #[test]
    fn disjoint_preimages_make_separate_clusters() {
        let (mut g, mut values) = fixture();
        // bolt on a second low-valued component
        g.add_edge("p", "q", None);
        values.insert("p".to_string(), 0.0);
        values.insert("q".to_string(), 0.5);
        let cover = Cover::new(&values, 2, 0.2);
        let summary =
            SummaryGraph::build(&g, &values, &cover, "connected_components", "shared_nodes")
                .unwrap();
        let low_clusters = summary.nodes.iter().filter(|n| n.interval == 0).count();
        assert_eq!(low_clusters, 2);
    }

    #[test]
    fn node_size_filter_drops_incident_links() {
        let (g, values) = fixture();
        let cover = Cover::new(&values, 2, 0.5);
        let mut summary =
            SummaryGraph::build(&g, &values, &cover, "connected_components", "shared_nodes")
                .unwrap();
        summary.filter_by_node_size(100);
        assert_eq!(summary.node_count(), 0);
        assert!(summary.links.is_empty());
    }

    #[test]
    fn strip_keeps_sizes() {
        let (g, values) = fixture();
        let cover = Cover::new(&values, 2, 0.5);
        let mut summary =
            SummaryGraph::build(&g, &values, &cover, "connected_components", "shared_nodes")
                .unwrap();
        let sizes: Vec<usize> = summary.nodes.iter().map(|n| n.size).collect();
        summary.strip_components_from_nodes();
        assert!(summary.nodes.iter().all(|n| n.components.is_none()));
        assert_eq!(sizes, summary.nodes.iter().map(|n| n.size).collect::<Vec<_>>());
    }

    #[test]
    fn gcc_extraction_keeps_the_linked_part() {
        let (mut g, mut values) = fixture();
        g.add_node("iso");
        values.insert("iso".to_string(), 5.0);
        let cover = Cover::new(&values, 2, 0.5);
        let mut summary =
            SummaryGraph::build(&g, &values, &cover, "connected_components", "shared_nodes")
                .unwrap();
        let before = summary.node_count();
        summary.extract_greatest_connected_component();
        assert!(summary.node_count() < before);
        assert!(!summary.links.is_empty());
    }

    #[test]
    fn json_round_trip() {
        let (g, values) = fixture();
        let cover = Cover::new(&values, 2, 0.5);
        let summary =
            SummaryGraph::build(&g, &values, &cover, "connected_components", "shared_nodes")
                .unwrap();
        let bytes = summary.to_json_bytes().unwrap();
        let back = SummaryGraph::from_json_bytes(&bytes).unwrap();
        assert_eq!(back.node_count(), summary.node_count());
        assert_eq!(back.links.len(), summary.links.len());
    }
}
