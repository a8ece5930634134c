//! Single-source shortest-path search over a [`RoutingGraph`].
//!
//! Both algorithms produce a [`ShortestPathTree`]: per-node best costs plus
//! the edge that reached each node.  Dijkstra can stop as soon as a given
//! target is settled; Bellman-Ford always computes the full tree.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tc_core::{PointId, RoutingAlgorithm};

use crate::graph::RoutingGraph;
use crate::INFINITE_COSTS;

const NO_EDGE: u32 = u32::MAX;

/// Result of a shortest-path search from one source.
pub struct ShortestPathTree {
    source: PointId,
    /// dist[v] = best known cost to reach v; `INFINITE_COSTS` if unreached.
    dist: Vec<u64>,
    /// prev_edge[v] = edge index that reached v; `NO_EDGE` for the source and
    /// unreached nodes.
    prev_edge: Vec<u32>,
}

impl ShortestPathTree {
    pub fn source(&self) -> PointId {
        self.source
    }

    /// Cost from the source to `to`, or `INFINITE_COSTS` if unreachable.
    pub fn costs(&self, to: PointId) -> u64 {
        self.dist.get(to.index()).copied().unwrap_or(INFINITE_COSTS)
    }

    pub fn reaches(&self, to: PointId) -> bool {
        self.costs(to) != INFINITE_COSTS
    }

    /// Edge indices from the source to `to`, in travel order.
    ///
    /// `Some(vec![])` when `to` is the source; `None` when unreachable.
    pub fn edges_to(&self, graph: &RoutingGraph, to: PointId) -> Option<Vec<usize>> {
        if !self.reaches(to) {
            return None;
        }
        let mut edges = Vec::new();
        let mut cur = to;
        loop {
            let e = self.prev_edge[cur.index()];
            if e == NO_EDGE {
                break;
            }
            edges.push(e as usize);
            cur = graph.edge_from[e as usize];
        }
        edges.reverse();
        Some(edges)
    }
}

/// Run the configured algorithm.  `target` lets Dijkstra exit early.
pub fn shortest_paths(
    algorithm: RoutingAlgorithm,
    graph: &RoutingGraph,
    source: PointId,
    target: Option<PointId>,
) -> ShortestPathTree {
    match algorithm {
        RoutingAlgorithm::Dijkstra    => dijkstra(graph, source, target),
        RoutingAlgorithm::BellmanFord => bellman_ford(graph, source),
    }
}

/// Binary-heap Dijkstra.
///
/// With `target = Some(t)` the search stops once `t` is popped; entries for
/// other nodes may then be tentative.
pub fn dijkstra(graph: &RoutingGraph, source: PointId, target: Option<PointId>) -> ShortestPathTree {
    let n = graph.node_count();
    let mut tree = ShortestPathTree {
        source,
        dist: vec![INFINITE_COSTS; n],
        prev_edge: vec![NO_EDGE; n],
    };
    if !graph.contains(source) {
        return tree;
    }
    tree.dist[source.index()] = 0;

    // Min-heap: (cost, node).  Secondary key PointId makes tie-breaking
    // deterministic.
    let mut heap: BinaryHeap<Reverse<(u64, PointId)>> = BinaryHeap::new();
    heap.push(Reverse((0, source)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if Some(node) == target {
            break;
        }

        // Skip stale heap entries.
        if cost > tree.dist[node.index()] {
            continue;
        }

        for edge in graph.out_edges(node) {
            let neighbor = graph.edge_to[edge];
            let new_cost = cost.saturating_add(graph.edge_cost[edge]);

            if new_cost < tree.dist[neighbor.index()] {
                tree.dist[neighbor.index()] = new_cost;
                tree.prev_edge[neighbor.index()] = edge as u32;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    tree
}

/// Bellman-Ford edge relaxation.  Edge costs are never negative, so at most
/// `n - 1` rounds are needed; it stops early once a round changes nothing.
pub fn bellman_ford(graph: &RoutingGraph, source: PointId) -> ShortestPathTree {
    let n = graph.node_count();
    let mut tree = ShortestPathTree {
        source,
        dist: vec![INFINITE_COSTS; n],
        prev_edge: vec![NO_EDGE; n],
    };
    if !graph.contains(source) {
        return tree;
    }
    tree.dist[source.index()] = 0;

    for _ in 1..n.max(2) {
        let mut changed = false;
        for edge in 0..graph.edge_count() {
            let from = graph.edge_from[edge].index();
            if tree.dist[from] == INFINITE_COSTS {
                continue;
            }
            let to = graph.edge_to[edge].index();
            let new_cost = tree.dist[from].saturating_add(graph.edge_cost[edge]);
            if new_cost < tree.dist[to] {
                tree.dist[to] = new_cost;
                tree.prev_edge[to] = edge as u32;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    tree
}
