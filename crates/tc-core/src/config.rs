//! Kernel configuration.
//!
//! Typically loaded from a TOML/JSON file by the application crate (enable the
//! `serde` feature) and handed to the router, scheduler and reroute engine.
//! Every struct has a `Default` that matches a stock single-group plant.

// ── Router ────────────────────────────────────────────────────────────────────

/// Shortest-path algorithm used by point routers.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoutingAlgorithm {
    /// Binary-heap Dijkstra.  Early exit for single-target queries.
    #[default]
    Dijkstra,
    /// Edge-relaxation Bellman-Ford.  Slower; kept for parity checks.
    BellmanFord,
}

/// A built-in edge evaluator selectable from configuration.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvaluatorKind {
    /// Path length in mm.
    Distance,
    /// Expected travel time in ms at the lower of path and vehicle speed.
    TravelTime,
    /// A constant 1 per traversed path.
    Hops,
    /// Explicit per-path penalties stored on the path.
    ExplicitPenalties,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouterConfig {
    pub algorithm: RoutingAlgorithm,

    /// Group used for vehicles without an explicit routing group.
    pub default_routing_group: String,

    /// Evaluators summed to form the edge weight.  An empty list falls back
    /// to `Distance`.
    pub evaluators: Vec<EvaluatorKind>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            algorithm: RoutingAlgorithm::Dijkstra,
            default_routing_group: String::new(),
            evaluators: vec![EvaluatorKind::Distance],
        }
    }
}

// ── Rerouting ─────────────────────────────────────────────────────────────────

/// What to do with a route that cannot be replaced by a fresh one.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReroutingImpossibleStrategy {
    /// Disallow every step from the reroute source onward.
    PauseImmediately,
    /// Disallow steps from the first locked path onward.
    #[default]
    PauseAtPathLock,
    /// Leave every step allowed.
    IgnorePathLocks,
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReroutingConfig {
    pub impossible_strategy: ReroutingImpossibleStrategy,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Name given to the allocation worker thread.
    pub worker_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { worker_name: "tc-allocator".to_owned() }
    }
}

// ── KernelConfig ──────────────────────────────────────────────────────────────

/// Top-level kernel configuration.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelConfig {
    pub router: RouterConfig,
    pub rerouting: ReroutingConfig,
    pub scheduler: SchedulerConfig,
}
