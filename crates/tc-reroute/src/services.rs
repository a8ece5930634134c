//! Collaborators the reroute engine reads from and writes to.
//!
//! The kernel proper does not own transport orders or talk to vehicle
//! drivers; it reaches both through these traits.  The `InMemory*` types are
//! complete, lock-protected implementations for embedding and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{DriveOrder, MovementCommand, RerouteError, RerouteResult, TransportOrder};

/// Stores transport orders by name.
pub trait TransportOrderService: Send + Sync {
    fn transport_order(&self, name: &str) -> Option<TransportOrder>;

    /// Replace all drive orders of `name`, keeping its current index.
    fn update_drive_orders(&self, name: &str, drive_orders: Vec<DriveOrder>) -> RerouteResult<()>;
}

/// The kernel-side handle of one vehicle's driver.
pub trait VehicleController: Send + Sync {
    /// Movement commands sent to the vehicle and not yet reported done,
    /// oldest first.
    fn commands_sent(&self) -> Vec<MovementCommand>;

    /// Hand an updated transport order to the driver.
    fn set_transport_order(&self, order: &TransportOrder);
}

pub trait VehicleControllerPool: Send + Sync {
    fn controller(&self, vehicle: &str) -> Option<Arc<dyn VehicleController>>;
}

// ── In-memory implementations ─────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTransportOrderService {
    orders: RwLock<BTreeMap<String, TransportOrder>>,
}

impl InMemoryTransportOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: TransportOrder) {
        self.orders.write().insert(order.name.clone(), order);
    }
}

impl TransportOrderService for InMemoryTransportOrderService {
    fn transport_order(&self, name: &str) -> Option<TransportOrder> {
        self.orders.read().get(name).cloned()
    }

    fn update_drive_orders(&self, name: &str, drive_orders: Vec<DriveOrder>) -> RerouteResult<()> {
        let mut orders = self.orders.write();
        let order = orders
            .get_mut(name)
            .ok_or_else(|| RerouteError::UnknownTransportOrder(name.to_owned()))?;
        *order = order.with_drive_orders(drive_orders);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryVehicleController {
    commands: RwLock<Vec<MovementCommand>>,
    order:    RwLock<Option<TransportOrder>>,
}

impl InMemoryVehicleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&self, command: MovementCommand) {
        self.commands.write().push(command);
    }

    /// The vehicle finished the oldest outstanding command.
    pub fn command_executed(&self) -> Option<MovementCommand> {
        let mut commands = self.commands.write();
        if commands.is_empty() { None } else { Some(commands.remove(0)) }
    }

    /// The transport order last handed over, if any.
    pub fn transport_order(&self) -> Option<TransportOrder> {
        self.order.read().clone()
    }
}

impl VehicleController for InMemoryVehicleController {
    fn commands_sent(&self) -> Vec<MovementCommand> {
        self.commands.read().clone()
    }

    fn set_transport_order(&self, order: &TransportOrder) {
        *self.order.write() = Some(order.clone());
    }
}

#[derive(Default)]
pub struct InMemoryControllerPool {
    controllers: RwLock<BTreeMap<String, Arc<dyn VehicleController>>>,
}

impl InMemoryControllerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, vehicle: impl Into<String>, controller: Arc<dyn VehicleController>) {
        self.controllers.write().insert(vehicle.into(), controller);
    }

    pub fn detach(&self, vehicle: &str) -> Option<Arc<dyn VehicleController>> {
        self.controllers.write().remove(vehicle)
    }
}

impl VehicleControllerPool for InMemoryControllerPool {
    fn controller(&self, vehicle: &str) -> Option<Arc<dyn VehicleController>> {
        self.controllers.read().get(vehicle).cloned()
    }
}
