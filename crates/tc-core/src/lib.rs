//! `tc-core` — foundational types for the AGV traffic-control kernel.
//!
//! This crate is a dependency of every other `tc-*` crate.  It intentionally
//! has no `tc-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`ids`]       | `PointId`, `PathId`, `BlockId`, `VehicleId`, `ClientId`  |
//! | [`geo`]       | `Position` (layout coordinates in mm)                    |
//! | [`resource`]  | `ResourceRef`, `ResourceSet`                             |
//! | [`vehicle`]   | `VehicleProfile`, `Orientation`                          |
//! | [`config`]    | `KernelConfig` and its router/rerouting/scheduler parts  |
//! | [`error`]     | `TcError`, `TcResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod resource;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    EvaluatorKind, KernelConfig, ReroutingConfig, ReroutingImpossibleStrategy, RouterConfig,
    RoutingAlgorithm, SchedulerConfig,
};
pub use error::{TcError, TcResult};
pub use geo::Position;
pub use ids::{BlockId, ClientId, PathId, PointId, VehicleId};
pub use resource::{ResourceRef, ResourceSet};
pub use vehicle::{Orientation, VehicleProfile};
