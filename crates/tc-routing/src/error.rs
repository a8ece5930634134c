//! Routing-subsystem error type.
//!
//! Note that "no route" is *not* an error: unreachable destinations come back
//! as `None` or [`INFINITE_COSTS`](crate::INFINITE_COSTS).  Errors here are
//! caller mistakes such as asking for a point the plant does not define.

use thiserror::Error;

use tc_core::{PointId, TcError};
use tc_plant::PlantError;

/// Errors produced by `tc-routing`.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error(transparent)]
    Core(#[from] TcError),

    #[error(transparent)]
    Plant(#[from] PlantError),

    #[error("point {0} is not part of the plant model")]
    UnknownPoint(PointId),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
