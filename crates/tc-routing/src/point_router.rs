//! `PointRouter` — a routing graph plus the algorithm that searches it.
//!
//! One instance exists per routing group.  It never changes after
//! construction; when the plant changes, the [`Router`](crate::Router)
//! builds a replacement and swaps the `Arc`.

use std::collections::BTreeMap;
use std::time::Instant;

use tc_core::{PointId, RoutingAlgorithm};

use crate::algorithm::{shortest_paths, ShortestPathTree};
use crate::graph::RoutingGraph;
use crate::{Route, Step, INFINITE_COSTS};

pub struct PointRouter {
    graph:     RoutingGraph,
    algorithm: RoutingAlgorithm,
}

impl PointRouter {
    pub fn new(graph: RoutingGraph, algorithm: RoutingAlgorithm) -> Self {
        Self { graph, algorithm }
    }

    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }

    pub fn algorithm(&self) -> RoutingAlgorithm {
        self.algorithm
    }

    /// The cheapest route from `source` to `destination`.
    ///
    /// Equal endpoints give an empty route with zero cost.  `None` means the
    /// destination is unreachable in this group's graph.
    pub fn route(&self, source: PointId, destination: PointId) -> Option<Route> {
        if source == destination {
            return Some(Route::empty());
        }
        let started = Instant::now();
        let tree = shortest_paths(self.algorithm, &self.graph, source, Some(destination));
        let route = self.route_in(&tree, destination);
        tracing::debug!(
            group = %self.graph.group,
            %source,
            %destination,
            found = route.is_some(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "computed route"
        );
        route
    }

    /// Routes from `source` to each of `destinations` using a single
    /// shortest-path tree.  Unreachable destinations are left out.
    pub fn routes_from(&self, source: PointId, destinations: &[PointId]) -> BTreeMap<PointId, Route> {
        let tree = shortest_paths(self.algorithm, &self.graph, source, None);
        destinations
            .iter()
            .filter_map(|&d| {
                let route = if d == source { Some(Route::empty()) } else { self.route_in(&tree, d) };
                route.map(|r| (d, r))
            })
            .collect()
    }

    /// Cost of the cheapest route, or [`INFINITE_COSTS`] if there is none.
    pub fn costs(&self, source: PointId, destination: PointId) -> u64 {
        if source == destination {
            return 0;
        }
        shortest_paths(self.algorithm, &self.graph, source, Some(destination)).costs(destination)
    }

    fn route_in(&self, tree: &ShortestPathTree, destination: PointId) -> Option<Route> {
        let edges = tree.edges_to(&self.graph, destination)?;
        let steps = edges
            .into_iter()
            .enumerate()
            .map(|(i, e)| {
                Step::new(
                    self.graph.edge_path[e],
                    self.graph.edge_from[e],
                    self.graph.edge_to[e],
                    self.graph.edge_orientation[e],
                    i as u32,
                )
            })
            .collect();
        let costs = tree.costs(destination);
        debug_assert_ne!(costs, INFINITE_COSTS);
        Some(Route::new(steps, costs))
    }
}
