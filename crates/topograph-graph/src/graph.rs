use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node-link wire form of a graph, the canonical on-disk representation:
/// `{"nodes": [{"id": ...}], "links": [{"source": ..., "target": ..., "value": ...}]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeLinkData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Undirected weighted graph with string node ids, an O(1) id -> index map
/// and adjacency lists. Edge weights default to 1.0 where the input carries
/// none. Node enumeration order is insertion order and is load-bearing for
/// component tie-breaking.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<(usize, f64)>>,
    links: Vec<GraphLink>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_node_link(data: NodeLinkData) -> Self {
        let mut graph = Self::new();
        for node in data.nodes {
            let idx = graph.add_node(&node.id);
            graph.nodes[idx].x = node.x;
            graph.nodes[idx].y = node.y;
        }
        for link in data.links {
            graph.add_edge(&link.source, &link.target, link.value);
        }
        graph
    }

    pub fn to_node_link(&self) -> NodeLinkData {
        NodeLinkData {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
        }
    }

    /// Returns the node's index, inserting it if unseen.
    pub fn add_node(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(GraphNode::new(id));
        self.index.insert(id.to_string(), idx);
        self.adjacency.push(Vec::new());
        idx
    }

    pub fn add_edge(&mut self, source: &str, target: &str, value: Option<f64>) {
        let s = self.add_node(source);
        let t = self.add_node(target);
        let weight = value.unwrap_or(1.0);
        self.adjacency[s].push((t, weight));
        if s != t {
            self.adjacency[t].push((s, weight));
        }
        self.links.push(GraphLink {
            source: source.to_string(),
            target: target.to_string(),
            value,
        });
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    pub fn node_id(&self, idx: usize) -> &str {
        &self.nodes[idx].id
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn neighbors(&self, idx: usize) -> &[(usize, f64)] {
        &self.adjacency[idx]
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    pub fn weighted_degree(&self, idx: usize) -> f64 {
        self.adjacency[idx].iter().map(|&(_, w)| w).sum()
    }

    pub fn set_position(&mut self, idx: usize, x: f64, y: f64) {
        self.nodes[idx].x = Some(x);
        self.nodes[idx].y = Some(y);
    }

    pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
        match (self.nodes[idx].x, self.nodes[idx].y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    /// Connected components in node enumeration order: the component of the
    /// lowest-index unvisited node comes first.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = Vec::new();
        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = std::collections::VecDeque::from([start]);
            seen[start] = true;
            while let Some(u) = queue.pop_front() {
                component.push(u);
                for &(v, _) in &self.adjacency[u] {
                    if !seen[v] {
                        seen[v] = true;
                        queue.push_back(v);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// Greatest connected component by node count; ties keep the earliest
    /// enumerated component.
    pub fn greatest_connected_component(&self) -> Vec<usize> {
        self.connected_components()
            .into_iter()
            .fold(Vec::new(), |best, c| {
                if c.len() > best.len() {
                    c
                } else {
                    best
                }
            })
    }

    /// Subgraph induced by `keep`, preserving the original node enumeration
    /// order regardless of the order of `keep`.
    pub fn induced_subgraph(&self, keep: &[usize]) -> FilterGraph {
        let members: std::collections::HashSet<usize> = keep.iter().copied().collect();
        let mut sub = FilterGraph::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if members.contains(&idx) {
                let new_idx = sub.add_node(&node.id);
                sub.nodes[new_idx].x = node.x;
                sub.nodes[new_idx].y = node.y;
            }
        }
        for link in &self.links {
            let s = self.index.get(&link.source);
            let t = self.index.get(&link.target);
            if let (Some(s), Some(t)) = (s, t) {
                if members.contains(s) && members.contains(t) {
                    sub.add_edge(&link.source, &link.target, link.value);
                }
            }
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> FilterGraph {
        // triangle a-b-c plus a larger component d-e-f-g
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("b", "c", None);
        g.add_edge("c", "a", None);
        g.add_edge("d", "e", None);
        g.add_edge("e", "f", None);
        g.add_edge("f", "g", None);
        g
    }

    #[test]
    fn components_and_gcc() {
        let g = two_triangles();
        let components = g.connected_components();
        assert_eq!(components.len(), 2);
        assert!(!g.is_connected());

        let gcc = g.greatest_connected_component();
        let ids: Vec<&str> = gcc.iter().map(|&i| g.node_id(i)).collect();
        assert_eq!(ids, vec!["d", "e", "f", "g"]);
    }

    #[test]
    fn gcc_ties_keep_first_enumerated() {
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("c", "d", None);
        let gcc = g.greatest_connected_component();
        let ids: Vec<&str> = gcc.iter().map(|&i| g.node_id(i)).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn induced_subgraph_keeps_enumeration_order() {
        let g = two_triangles();
        let keep = vec![6, 4, 3, 5]; // d..g in scrambled order
        let sub = g.induced_subgraph(&keep);
        let ids: Vec<&str> = sub.node_ids().collect();
        assert_eq!(ids, vec!["d", "e", "f", "g"]);
        assert_eq!(sub.edge_count(), 3);
    }

    #[test]
    fn node_link_round_trip() {
        let g = two_triangles();
        let back = FilterGraph::from_node_link(g.to_node_link());
        assert_eq!(back.node_count(), g.node_count());
        assert_eq!(back.edge_count(), g.edge_count());
        let ids: Vec<&str> = back.node_ids().collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e", "f", "g"]);
    }

    #[test]
    fn duplicate_add_node_is_idempotent() {
        let mut g = FilterGraph::new();
        assert_eq!(g.add_node("a"), 0);
        assert_eq!(g.add_node("a"), 0);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn weights_default_to_one() {
        let mut g = FilterGraph::new();
        g.add_edge("a", "b", None);
        g.add_edge("a", "c", Some(2.5));
        assert_eq!(g.weighted_degree(0), 3.5);
    }
}
