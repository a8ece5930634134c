//! `EdgeEvaluator` — pluggable cost function for graph edges.
//!
//! The graph builder asks the evaluator once per path and allowed travel
//! direction.  The returned cost becomes the edge weight; returning
//! [`INFINITE_COSTS`] drops the edge from the graph entirely.
//!
//! Evaluators compose by summation: chain two with `a.plus(b)`, or build an
//! [`EvaluatorComposite`] from the configured [`EvaluatorKind`] list.

use tc_core::{EvaluatorKind, Orientation, VehicleProfile};
use tc_plant::Path;

use crate::INFINITE_COSTS;

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Cost of traversing one path in one direction with one vehicle.
///
/// # Contract
///
/// - Must be deterministic for the same inputs (routes must be reproducible).
/// - Must not block or perform I/O.
/// - Implementations must be `Send + Sync`: one evaluator is shared by every
///   point router and may run on rayon threads.
pub trait EdgeEvaluator: Send + Sync {
    /// Called before the first `evaluate` of a graph build.
    fn on_graph_computation_start(&self, _vehicle: &VehicleProfile) {}

    /// Called after the last `evaluate` of a graph build.
    fn on_graph_computation_end(&self, _vehicle: &VehicleProfile) {}

    /// Cost of the edge, or [`INFINITE_COSTS`] if it must not be used.
    fn evaluate(&self, path: &Path, orientation: Orientation, vehicle: &VehicleProfile) -> u64;
}

impl<E: EdgeEvaluator + ?Sized> EdgeEvaluator for Box<E> {
    fn on_graph_computation_start(&self, vehicle: &VehicleProfile) {
        (**self).on_graph_computation_start(vehicle)
    }

    fn on_graph_computation_end(&self, vehicle: &VehicleProfile) {
        (**self).on_graph_computation_end(vehicle)
    }

    fn evaluate(&self, path: &Path, orientation: Orientation, vehicle: &VehicleProfile) -> u64 {
        (**self).evaluate(path, orientation, vehicle)
    }
}

// ── Built-in evaluators ───────────────────────────────────────────────────────

/// Path length in mm.
pub struct EvaluatorDistance;

impl EdgeEvaluator for EvaluatorDistance {
    #[inline]
    fn evaluate(&self, path: &Path, _orientation: Orientation, _vehicle: &VehicleProfile) -> u64 {
        path.length_mm
    }
}

/// Expected travel time in ms, at the lower of the path's and the vehicle's
/// speed limit for the travel direction.
pub struct EvaluatorTravelTime;

impl EdgeEvaluator for EvaluatorTravelTime {
    fn evaluate(&self, path: &Path, orientation: Orientation, vehicle: &VehicleProfile) -> u64 {
        let vehicle_speed = match orientation {
            Orientation::Forward  => vehicle.max_velocity,
            Orientation::Backward => vehicle.max_reverse_velocity,
        };
        let speed = path.velocity(orientation).min(vehicle_speed);
        if speed == 0 {
            return INFINITE_COSTS;
        }
        path.length_mm.saturating_mul(1_000) / u64::from(speed)
    }
}

/// One unit per path: the route with the fewest paths wins.
pub struct EvaluatorHops;

impl EdgeEvaluator for EvaluatorHops {
    #[inline]
    fn evaluate(&self, _path: &Path, _orientation: Orientation, _vehicle: &VehicleProfile) -> u64 {
        1
    }
}

/// The per-direction penalty stored on the path itself.
pub struct EvaluatorExplicitPenalties;

impl EdgeEvaluator for EvaluatorExplicitPenalties {
    #[inline]
    fn evaluate(&self, path: &Path, orientation: Orientation, _vehicle: &VehicleProfile) -> u64 {
        path.penalty(orientation)
    }
}

// ── Composition ───────────────────────────────────────────────────────────────

/// Sum of two evaluators.  Infinite on either side stays infinite.
///
/// Construct with `first.plus(second)`.
pub struct Summed<A: EdgeEvaluator, B: EdgeEvaluator> {
    first:  A,
    second: B,
}

impl<A: EdgeEvaluator, B: EdgeEvaluator> EdgeEvaluator for Summed<A, B> {
    fn on_graph_computation_start(&self, vehicle: &VehicleProfile) {
        self.first.on_graph_computation_start(vehicle);
        self.second.on_graph_computation_start(vehicle);
    }

    fn on_graph_computation_end(&self, vehicle: &VehicleProfile) {
        self.first.on_graph_computation_end(vehicle);
        self.second.on_graph_computation_end(vehicle);
    }

    fn evaluate(&self, path: &Path, orientation: Orientation, vehicle: &VehicleProfile) -> u64 {
        self.first
            .evaluate(path, orientation, vehicle)
            .saturating_add(self.second.evaluate(path, orientation, vehicle))
    }
}

/// Extension trait that adds `.plus(other)` to any `EdgeEvaluator`.
pub trait EdgeEvaluatorExt: EdgeEvaluator + Sized {
    fn plus<B: EdgeEvaluator>(self, other: B) -> Summed<Self, B> {
        Summed { first: self, second: other }
    }
}

impl<E: EdgeEvaluator + Sized> EdgeEvaluatorExt for E {}

/// A runtime-assembled sum of evaluators.
pub struct EvaluatorComposite {
    parts: Vec<Box<dyn EdgeEvaluator>>,
}

impl EvaluatorComposite {
    pub fn new(parts: Vec<Box<dyn EdgeEvaluator>>) -> Self {
        Self { parts }
    }

    /// Build from configuration.  An empty list means distance only.
    pub fn from_config(kinds: &[EvaluatorKind]) -> Self {
        if kinds.is_empty() {
            return Self::new(vec![Box::new(EvaluatorDistance)]);
        }
        Self::new(kinds.iter().map(|&k| builtin(k)).collect())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn builtin(kind: EvaluatorKind) -> Box<dyn EdgeEvaluator> {
    match kind {
        EvaluatorKind::Distance          => Box::new(EvaluatorDistance),
        EvaluatorKind::TravelTime        => Box::new(EvaluatorTravelTime),
        EvaluatorKind::Hops              => Box::new(EvaluatorHops),
        EvaluatorKind::ExplicitPenalties => Box::new(EvaluatorExplicitPenalties),
    }
}

impl EdgeEvaluator for EvaluatorComposite {
    fn on_graph_computation_start(&self, vehicle: &VehicleProfile) {
        for part in &self.parts {
            part.on_graph_computation_start(vehicle);
        }
    }

    fn on_graph_computation_end(&self, vehicle: &VehicleProfile) {
        for part in &self.parts {
            part.on_graph_computation_end(vehicle);
        }
    }

    fn evaluate(&self, path: &Path, orientation: Orientation, vehicle: &VehicleProfile) -> u64 {
        self.parts
            .iter()
            .map(|p| p.evaluate(path, orientation, vehicle))
            .fold(0u64, u64::saturating_add)
    }
}
