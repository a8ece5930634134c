//! What the reroute engine needs to know about a vehicle.

use tc_core::{PointId, Position, VehicleProfile};

/// Whether the vehicle is working on a drive order right now.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcState {
    #[default]
    Idle,
    /// Assigned a transport order, waiting for its next drive order.
    AwaitingOrder,
    /// Executing the current drive order.
    ProcessingOrder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VehicleState {
    pub profile:          VehicleProfile,
    pub proc_state:       ProcState,
    /// Last point the vehicle reported being at.
    pub current_position: Option<PointId>,
    /// Reported layout coordinates, used when no point is known.
    pub precise_position: Option<Position>,
    /// Name of the transport order being processed.
    pub transport_order:  Option<String>,
}

impl VehicleState {
    pub fn new(profile: VehicleProfile) -> Self {
        Self {
            profile,
            proc_state: ProcState::Idle,
            current_position: None,
            precise_position: None,
            transport_order: None,
        }
    }

    pub fn at(mut self, point: PointId) -> Self {
        self.current_position = Some(point);
        self
    }

    pub fn at_position(mut self, position: Position) -> Self {
        self.precise_position = Some(position);
        self
    }

    pub fn processing(mut self, order: impl Into<String>, proc_state: ProcState) -> Self {
        self.transport_order = Some(order.into());
        self.proc_state = proc_state;
        self
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn is_processing_order(&self) -> bool {
        self.transport_order.is_some()
    }
}
