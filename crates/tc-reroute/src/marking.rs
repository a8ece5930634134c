//! Fallback marking for routes that could not be replaced.
//!
//! When no new route exists the vehicle keeps its current one, but steps it
//! must not execute yet are flagged `execution_allowed = false` according to
//! the configured [`ReroutingImpossibleStrategy`].

use tc_core::{PointId, ReroutingImpossibleStrategy};
use tc_plant::PlantModel;
use tc_routing::{Route, Step};

use crate::DriveOrder;

/// Copy `order` with its steps replaced by `map(step)`.
fn map_steps(order: &DriveOrder, mut map: impl FnMut(&Step) -> Step) -> DriveOrder {
    match &order.route {
        Some(route) => {
            let steps = route.steps.iter().map(&mut map).collect();
            order.with_route(Route::new(steps, route.costs))
        }
        None => order.clone(),
    }
}

/// Refresh every step's lock flag from `model`.
///
/// Only `path_locked` changes; `execution_allowed` keeps whatever an earlier
/// marking set.  A path missing from the model is treated as locked.
pub fn update_path_locks(model: &PlantModel, orders: &[DriveOrder]) -> Vec<DriveOrder> {
    orders
        .iter()
        .map(|order| {
            map_steps(order, |step| {
                let locked = model.path(step.path).is_none_or(|p| p.locked);
                step.with_path_locked(locked)
            })
        })
        .collect()
}

pub fn contains_locked_path(orders: &[DriveOrder]) -> bool {
    orders.iter().flat_map(DriveOrder::steps).any(|s| s.path_locked)
}

/// Decides step by step whether execution is still allowed.
///
/// Sticky: once a step is refused, every later step is refused too.
#[derive(Clone, Debug)]
pub struct ExecutionTest {
    strategy: ReroutingImpossibleStrategy,
    /// Earliest point from which execution may be refused.
    source:   PointId,
    allowed:  bool,
}

impl ExecutionTest {
    pub fn new(strategy: ReroutingImpossibleStrategy, source: PointId) -> Self {
        Self { strategy, source, allowed: true }
    }

    pub fn test(&mut self, step: &Step) -> bool {
        if !self.allowed {
            return false;
        }
        self.allowed = match self.strategy {
            ReroutingImpossibleStrategy::PauseImmediately => step.source != self.source,
            ReroutingImpossibleStrategy::PauseAtPathLock => !step.path_locked,
            ReroutingImpossibleStrategy::IgnorePathLocks => true,
        };
        self.allowed
    }
}

/// Set `execution_allowed` on every step of `orders` per `strategy`.
///
/// Nothing changes under `IgnorePathLocks` or when no step is locked.
pub fn mark_restricted_steps(
    orders: Vec<DriveOrder>,
    strategy: ReroutingImpossibleStrategy,
    source: PointId,
) -> Vec<DriveOrder> {
    if strategy == ReroutingImpossibleStrategy::IgnorePathLocks || !contains_locked_path(&orders) {
        return orders;
    }
    let mut test = ExecutionTest::new(strategy, source);
    orders
        .iter()
        .map(|order| {
            map_steps(order, |step| {
                let allowed = test.test(step);
                tracing::debug!(path = %step.path, allowed, "marking step");
                step.with_execution_allowed(allowed)
            })
        })
        .collect()
}
