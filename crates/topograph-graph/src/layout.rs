//! Deterministic radial seed layout for canonical graphs. Serves as the
//! initial placement the client refines; identical input graphs always get
//! identical positions.

use crate::FilterGraph;
use std::collections::VecDeque;
use std::f64::consts::TAU;

const RING_SPACING: f64 = 60.0;

/// BFS-ring placement: the highest-degree node sits at the origin, nodes at
/// hop distance k share the circle of radius `k * RING_SPACING`, spread at
/// equal angles in BFS discovery order. Nodes unreachable from the center
/// land on one ring past the deepest reachable one.
pub fn initialize_radial_layout(graph: &mut FilterGraph) {
    let n = graph.node_count();
    if n == 0 {
        return;
    }

    let center = (0..n)
        .max_by_key(|&idx| (graph.degree(idx), std::cmp::Reverse(idx)))
        .unwrap_or(0);

    let mut ring = vec![usize::MAX; n];
    let mut rings: Vec<Vec<usize>> = vec![vec![center]];
    ring[center] = 0;
    let mut queue = VecDeque::from([center]);
    while let Some(u) = queue.pop_front() {
        for &(v, _) in graph.neighbors(u) {
            if ring[v] == usize::MAX {
                ring[v] = ring[u] + 1;
                if rings.len() == ring[v] {
                    rings.push(Vec::new());
                }
                rings[ring[v]].push(v);
                queue.push_back(v);
            }
        }
    }

    let stragglers: Vec<usize> = (0..n).filter(|&idx| ring[idx] == usize::MAX).collect();
    if !stragglers.is_empty() {
        rings.push(stragglers);
    }

    for (depth, members) in rings.iter().enumerate() {
        let radius = depth as f64 * RING_SPACING;
        let count = members.len() as f64;
        for (slot, &idx) in members.iter().enumerate() {
            let angle = TAU * slot as f64 / count;
            graph.set_position(idx, radius * angle.cos(), radius * angle.sin());
        }
    }
}
