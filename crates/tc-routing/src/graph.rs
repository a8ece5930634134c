//! Weighted routing graph derived from a plant snapshot.
//!
//! # Data layout
//!
//! Nodes are the plant's points, indexed by `PointId`.  Edges are read off
//! the plant model's incident-path CSR and stored in the same layout: the
//! outgoing edges of point `p` are the edge indices
//! `node_out_start[p] .. node_out_start[p+1]`, and every per-edge vector
//! (`edge_from`, `edge_to`, `edge_path`, ...) is indexed by that edge index.
//!
//! # Which edges exist
//!
//! Each path yields at most two edges, one per travel direction.  A direction
//! is omitted when
//!
//! - the path is locked,
//! - its velocity for that direction is 0,
//! - the path or either endpoint is not usable by the routing group,
//! - either endpoint is in the caller's excluded set, or
//! - the edge evaluator reports [`INFINITE_COSTS`].
//!
//! Edges are ordered by source point, then path id, then forward before
//! backward, so shortest-path tie-breaking is reproducible.

use std::ops::Range;

use rustc_hash::FxHashSet;

use tc_core::{Orientation, PathId, PointId, VehicleProfile};
use tc_plant::PlantModel;

use crate::{EdgeEvaluator, INFINITE_COSTS};

/// A directed, weighted graph for one routing group.
pub struct RoutingGraph {
    /// Routing group this graph was filtered for.
    pub group: String,

    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    pub edge_from:        Vec<PointId>,
    pub edge_to:          Vec<PointId>,
    pub edge_path:        Vec<PathId>,
    pub edge_orientation: Vec<Orientation>,
    pub edge_cost:        Vec<u64>,
}

struct RawEdge {
    from:        PointId,
    to:          PointId,
    path:        PathId,
    orientation: Orientation,
    cost:        u64,
}

impl RoutingGraph {
    /// Build the graph for `group` from `model`.
    ///
    /// `vehicle` is handed to the evaluator; `excluded` points lose all their
    /// edges (they stay in the node range so `PointId`s remain valid indices).
    pub fn build(
        model: &PlantModel,
        group: &str,
        vehicle: &VehicleProfile,
        evaluator: &dyn EdgeEvaluator,
        excluded: &FxHashSet<PointId>,
    ) -> Self {
        let node_count = model.point_count();
        let point_usable = |id: PointId| {
            !excluded.contains(&id) && model.point(id).is_some_and(|p| p.usable_by_group(group))
        };

        evaluator.on_graph_computation_start(vehicle);

        // Walking each point's incident paths yields edges already grouped by
        // source, in path-id order with forward first.
        let mut raw: Vec<RawEdge> = Vec::with_capacity(model.path_count() * 2);
        let mut node_out_start = vec![0u32; node_count + 1];
        for point in model.points.iter().map(|p| p.id) {
            if point_usable(point) {
                for &path_id in model.incident_paths(point) {
                    let Some(path) = model.path(path_id) else { continue };
                    if path.locked || !path.usable_by_group(group) {
                        continue;
                    }
                    for orientation in [Orientation::Forward, Orientation::Backward] {
                        let (from, to) = path.endpoints(orientation);
                        if from != point || !path.allows(orientation) || !point_usable(to) {
                            continue;
                        }
                        let cost = evaluator.evaluate(path, orientation, vehicle);
                        if cost == INFINITE_COSTS {
                            continue;
                        }
                        raw.push(RawEdge { from, to, path: path.id, orientation, cost });
                    }
                }
            }
            node_out_start[point.index() + 1] = raw.len() as u32;
        }

        evaluator.on_graph_computation_end(vehicle);

        let mut graph = RoutingGraph {
            group: group.to_owned(),
            node_out_start,
            edge_from:        Vec::with_capacity(raw.len()),
            edge_to:          Vec::with_capacity(raw.len()),
            edge_path:        Vec::with_capacity(raw.len()),
            edge_orientation: Vec::with_capacity(raw.len()),
            edge_cost:        Vec::with_capacity(raw.len()),
        };
        for e in raw {
            graph.edge_from.push(e.from);
            graph.edge_to.push(e.to);
            graph.edge_path.push(e.path);
            graph.edge_orientation.push(e.orientation);
            graph.edge_cost.push(e.cost);
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.node_out_start.len() - 1
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    /// `true` if `point` is a node of this graph (it may still have no edges).
    #[inline]
    pub fn contains(&self, point: PointId) -> bool {
        point.index() < self.node_count()
    }

    /// Indices of the edges leaving `point`.
    #[inline]
    pub fn out_edges(&self, point: PointId) -> Range<usize> {
        let start = self.node_out_start[point.index()] as usize;
        let end   = self.node_out_start[point.index() + 1] as usize;
        start..end
    }
}
