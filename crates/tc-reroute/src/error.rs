use tc_core::PointId;
use tc_routing::RoutingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerouteError {
    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),

    #[error("transport order '{0}' does not exist")]
    UnknownTransportOrder(String),

    #[error("transport order '{0}' has no current drive order")]
    NoCurrentDriveOrder(String),

    #[error("no vehicle controller for '{0}'")]
    NoController(String),

    #[error("position of vehicle '{0}' is unknown")]
    UnknownPosition(String),

    /// The new route starts at a point the current route never leaves from.
    #[error("no step of the current route starts at {0}")]
    NoBranchingPoint(PointId),

    #[error("replacement route for the current drive order has no steps")]
    EmptyReplacement,
}

pub type RerouteResult<T> = Result<T, RerouteError>;
