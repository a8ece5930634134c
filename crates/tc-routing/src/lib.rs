//! `tc-routing` — edge evaluation, routing graphs, and the point-router cache.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | [`route`]        | `Route`, `Step`, `ReroutingType`, `INFINITE_COSTS`        |
//! | [`evaluator`]    | `EdgeEvaluator` trait, built-in evaluators, composition   |
//! | [`graph`]        | `RoutingGraph` (CSR) built per routing group              |
//! | [`algorithm`]    | Dijkstra, Bellman-Ford, `ShortestPathTree`                |
//! | [`point_router`] | `PointRouter` — one group's graph plus its algorithm      |
//! | [`router`]       | `Router` — cached point routers over a `PlantStore`       |
//! | [`error`]        | `RoutingError`, `RoutingResult<T>`                        |
//!
//! # Cost units
//!
//! Costs are whatever the configured evaluators return, summed as `u64` with
//! saturation.  The default (`Distance`) is millimetres.  `INFINITE_COSTS`
//! (`u64::MAX`) marks an unreachable destination.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | `Router::costs_from_many` evaluates candidates with rayon. |
//! | `serde`    | Derives `Serialize`/`Deserialize` on `Route` and `Step`.   |

pub mod algorithm;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod point_router;
pub mod route;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{RoutingError, RoutingResult};
pub use evaluator::{
    EdgeEvaluator, EdgeEvaluatorExt, EvaluatorComposite, EvaluatorDistance,
    EvaluatorExplicitPenalties, EvaluatorHops, EvaluatorTravelTime, Summed,
};
pub use graph::RoutingGraph;
pub use point_router::PointRouter;
pub use route::{ReroutingType, Route, Step, INFINITE_COSTS};
pub use router::Router;
