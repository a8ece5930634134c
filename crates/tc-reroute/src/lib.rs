//! `tc-reroute` — rerouting vehicles that are already executing an order.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`order`]    | `TransportOrder`, `DriveOrder`, `Destination`, `MovementCommand` |
//! | [`vehicle`]  | `VehicleState`, `ProcState`                                     |
//! | [`services`] | Order service and controller traits, in-memory implementations |
//! | [`merge`]    | Splicing a new route into the current one                       |
//! | [`marking`]  | Lock refresh and fallback step marking                          |
//! | [`engine`]   | `RerouteEngine`, `RerouteOutcome`                               |
//! | [`error`]    | `RerouteError`, `RerouteResult<T>`                              |
//!
//! # Guarantees
//!
//! - Past drive orders are never removed or reordered.
//! - Route indices of a merged route are contiguous from 0.
//! - A vehicle that cannot be rerouted keeps its last valid plan, possibly
//!   with steps paused by the fallback strategy.
//!
//! # Feature flags
//!
//! | Feature | Effect                                        |
//! |---------|-----------------------------------------------|
//! | `serde` | Derives for orders, destinations, proc states |

pub mod engine;
pub mod error;
pub mod marking;
pub mod merge;
pub mod order;
pub mod services;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use engine::{RerouteEngine, RerouteOutcome};
pub use error::{RerouteError, RerouteResult};
pub use order::{Destination, DriveOrder, DriveOrderState, MovementCommand, TransportOrder};
pub use services::{
    InMemoryControllerPool, InMemoryTransportOrderService, InMemoryVehicleController,
    TransportOrderService, VehicleController, VehicleControllerPool,
};
pub use vehicle::{ProcState, VehicleState};
