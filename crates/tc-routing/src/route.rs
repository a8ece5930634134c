//! `Route` and `Step` value types.
//!
//! Both are plain immutable values.  Code that needs a variant of a step
//! (renumbered, paused, lock flag refreshed) builds a new one with the
//! `with_*` functions; nothing is ever patched in place behind a shared
//! reference.

use tc_core::{Orientation, PathId, PointId};

/// Cost reported for a destination that cannot be reached.
pub const INFINITE_COSTS: u64 = u64::MAX;

/// How a step came to be part of its route.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReroutingType {
    /// Produced by a regular reroute.
    Regular,
}

// ── Step ──────────────────────────────────────────────────────────────────────

/// One traversal of one path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub path:              PathId,
    pub source:            PointId,
    pub destination:       PointId,
    pub orientation:       Orientation,
    /// Position of this step in its route, contiguous from 0.
    pub route_index:       u32,
    /// Cleared when a fallback policy pauses the vehicle before this step.
    pub execution_allowed: bool,
    /// Lock state of `path` when the step was last refreshed.
    pub path_locked:       bool,
    pub rerouting_type:    Option<ReroutingType>,
}

impl Step {
    pub fn new(
        path: PathId,
        source: PointId,
        destination: PointId,
        orientation: Orientation,
        route_index: u32,
    ) -> Self {
        Self {
            path,
            source,
            destination,
            orientation,
            route_index,
            execution_allowed: true,
            path_locked: false,
            rerouting_type: None,
        }
    }

    pub fn with_route_index(&self, route_index: u32) -> Self {
        Self { route_index, ..self.clone() }
    }

    pub fn with_execution_allowed(&self, execution_allowed: bool) -> Self {
        Self { execution_allowed, ..self.clone() }
    }

    pub fn with_path_locked(&self, path_locked: bool) -> Self {
        Self { path_locked, ..self.clone() }
    }

    pub fn with_rerouting_type(&self, rerouting_type: Option<ReroutingType>) -> Self {
        Self { rerouting_type, ..self.clone() }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} -> {} via {} ({})",
            self.route_index, self.source, self.destination, self.path, self.orientation
        )
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered sequence of steps plus the summed edge costs.
///
/// An empty route means the vehicle is already at its destination; it is
/// distinct from "no route", which routers report as `None`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub steps: Vec<Step>,
    pub costs: u64,
}

impl Route {
    pub fn new(steps: Vec<Step>, costs: u64) -> Self {
        Self { steps, costs }
    }

    /// The zero-cost route of a vehicle that need not move.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Source point of the first step.
    pub fn source_point(&self) -> Option<PointId> {
        self.steps.first().map(|s| s.source)
    }

    /// Destination point of the last step.
    pub fn final_destination(&self) -> Option<PointId> {
        self.steps.last().map(|s| s.destination)
    }

    /// The same steps with a different cost.
    pub fn with_costs(&self, costs: u64) -> Self {
        Self { steps: self.steps.clone(), costs }
    }

    /// The same cost with different steps.
    pub fn with_steps(&self, steps: Vec<Step>) -> Self {
        Self { steps, costs: self.costs }
    }

    /// Every point the route visits, in order, starting at its source.
    pub fn points(&self) -> Vec<PointId> {
        let mut points: Vec<PointId> = self.source_point().into_iter().collect();
        points.extend(self.steps.iter().map(|s| s.destination));
        points
    }
}
