//! Transport orders and their drive orders.
//!
//! A transport order is a list of drive orders plus the index of the one
//! being executed.  Everything before that index is *past*, the indexed
//! order is *current*, the rest is *future*.  Rerouting only ever replaces
//! current and future drive orders.

use std::fmt;

use tc_core::PointId;
use tc_routing::{Route, Step};

/// Lifecycle of one drive order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriveOrderState {
    #[default]
    Pristine,
    Travelling,
    Finished,
    Failed,
}

/// Where a drive order ends and what happens there.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destination {
    pub point:     PointId,
    pub operation: String,
}

impl Destination {
    pub fn new(point: PointId, operation: impl Into<String>) -> Self {
        Self { point, operation: operation.into() }
    }

    /// A destination with no operation; the vehicle just moves there.
    pub fn move_to(point: PointId) -> Self {
        Self::new(point, "MOVE")
    }
}

/// One leg of a transport order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveOrder {
    pub destination: Destination,
    /// `None` until the order has been routed.
    pub route:       Option<Route>,
    pub state:       DriveOrderState,
}

impl DriveOrder {
    pub fn new(destination: Destination) -> Self {
        Self { destination, route: None, state: DriveOrderState::Pristine }
    }

    pub fn with_route(&self, route: Route) -> Self {
        Self { route: Some(route), ..self.clone() }
    }

    pub fn with_state(&self, state: DriveOrderState) -> Self {
        Self { state, ..self.clone() }
    }

    /// Steps of the route, empty if unrouted.
    pub fn steps(&self) -> &[Step] {
        self.route.as_ref().map_or(&[], |r| r.steps.as_slice())
    }

    /// Where the route ends.  `None` if unrouted or the route is empty.
    pub fn final_destination(&self) -> Option<PointId> {
        self.route.as_ref().and_then(Route::final_destination)
    }
}

impl fmt::Display for DriveOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DriveOrder({} {}, {:?}", self.destination.point, self.destination.operation, self.state)?;
        if let Some(route) = &self.route {
            write!(f, ", {} steps", route.len())?;
        }
        write!(f, ")")
    }
}

// ── TransportOrder ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransportOrder {
    pub name:     String,
    drive_orders: Vec<DriveOrder>,
    current:      usize,
}

impl TransportOrder {
    pub fn new(name: impl Into<String>, drive_orders: Vec<DriveOrder>) -> Self {
        Self { name: name.into(), drive_orders, current: 0 }
    }

    pub fn drive_orders(&self) -> &[DriveOrder] {
        &self.drive_orders
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn past_drive_orders(&self) -> &[DriveOrder] {
        &self.drive_orders[..self.current.min(self.drive_orders.len())]
    }

    pub fn current_drive_order(&self) -> Option<&DriveOrder> {
        self.drive_orders.get(self.current)
    }

    pub fn future_drive_orders(&self) -> &[DriveOrder] {
        self.drive_orders.get(self.current + 1..).unwrap_or(&[])
    }

    /// Current plus future drive orders, in order.
    pub fn unfinished_drive_orders(&self) -> Vec<DriveOrder> {
        self.drive_orders.get(self.current..).unwrap_or(&[]).to_vec()
    }

    /// Replace the drive orders, keeping the current index.
    pub fn with_drive_orders(&self, drive_orders: Vec<DriveOrder>) -> Self {
        Self { name: self.name.clone(), drive_orders, current: self.current }
    }

    /// Finish the current drive order and make the next one current.
    pub fn advance(&mut self) {
        if let Some(order) = self.drive_orders.get_mut(self.current) {
            order.state = DriveOrderState::Finished;
            self.current += 1;
        }
        if let Some(next) = self.drive_orders.get_mut(self.current) {
            next.state = DriveOrderState::Travelling;
        }
    }
}

/// A step handed to a vehicle driver for execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementCommand {
    pub step: Step,
}

impl MovementCommand {
    pub fn new(step: Step) -> Self {
        Self { step }
    }
}
