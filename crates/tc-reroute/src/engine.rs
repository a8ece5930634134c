//! `RerouteEngine` — recomputes the plan of a vehicle that is already driving.
//!
//! # Steps of one reroute
//!
//! 1. Resolve the reroute source: the destination of the last movement
//!    command already sent, else the reported point, else the point nearest
//!    the reported precise position.
//! 2. Route from there through the destinations of the current and future
//!    drive orders.
//! 3. No route: keep the current drive orders, refresh their lock flags and
//!    mark restricted steps with the configured fallback strategy.
//! 4. If the vehicle is processing its current drive order, either keep that
//!    order unchanged (every command for it has been sent already) or merge
//!    its route with the new one at the branching point.
//! 5. Store past + new drive orders, hand the order to the controller if the
//!    vehicle is processing, and tell the router which routes were selected.
//!
//! A failed reroute (for example a missing branching point) leaves the
//! transport order, the controller and the router untouched.

use std::sync::Arc;

use tc_core::{PointId, ReroutingConfig, VehicleId, VehicleProfile};
use tc_routing::{ReroutingType, Route, Router};

use crate::marking::{mark_restricted_steps, update_path_locks};
use crate::merge::merge_drive_orders;
use crate::{
    DriveOrder, ProcState, RerouteError, RerouteResult, TransportOrder, TransportOrderService,
    VehicleController, VehicleControllerPool, VehicleState,
};

/// What [`RerouteEngine::reroute`] did.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RerouteOutcome {
    /// The vehicle has no transport order; nothing was changed.
    NotProcessingOrder,
    /// A new route was found and installed.
    Rerouted,
    /// No route exists; the old route was kept with restricted steps marked.
    Restricted,
}

pub struct RerouteEngine {
    router:      Arc<Router>,
    orders:      Arc<dyn TransportOrderService>,
    controllers: Arc<dyn VehicleControllerPool>,
    config:      ReroutingConfig,
}

impl RerouteEngine {
    pub fn new(
        router: Arc<Router>,
        orders: Arc<dyn TransportOrderService>,
        controllers: Arc<dyn VehicleControllerPool>,
        config: ReroutingConfig,
    ) -> Self {
        Self { router, orders, controllers, config }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn config(&self) -> &ReroutingConfig {
        &self.config
    }

    /// Reroute every vehicle in turn.  A failure for one vehicle does not stop
    /// the others.
    pub fn reroute_all(&self, vehicles: &[VehicleState]) -> Vec<(VehicleId, RerouteResult<RerouteOutcome>)> {
        vehicles
            .iter()
            .map(|v| {
                let result = self.reroute(v);
                if let Err(e) = &result {
                    tracing::warn!(vehicle = v.name(), error = %e, "reroute failed");
                }
                (v.profile.id, result)
            })
            .collect()
    }

    pub fn reroute(&self, vehicle: &VehicleState) -> RerouteResult<RerouteOutcome> {
        tracing::debug!(vehicle = vehicle.name(), "trying to reroute");
        let Some(order_name) = vehicle.transport_order.as_deref() else {
            tracing::warn!(
                vehicle = vehicle.name(),
                "cannot reroute a vehicle that is not processing a transport order"
            );
            return Ok(RerouteOutcome::NotProcessingOrder);
        };

        let original = self
            .orders
            .transport_order(order_name)
            .ok_or_else(|| RerouteError::UnknownTransportOrder(order_name.to_owned()))?;
        let controller = self
            .controllers
            .controller(vehicle.name())
            .ok_or_else(|| RerouteError::NoController(vehicle.name().to_owned()))?;
        let source = self.reroute_source(vehicle, controller.as_ref())?;

        let unfinished = original.unfinished_drive_orders();
        if unfinished.is_empty() {
            return Err(RerouteError::NoCurrentDriveOrder(original.name.clone()));
        }

        let (mut new_orders, outcome) = match self.try_reroute(&vehicle.profile, source, &unfinished)? {
            Some(orders) => {
                tracing::debug!(vehicle = vehicle.name(), %source, "found a new route");
                (orders, RerouteOutcome::Rerouted)
            }
            None => {
                tracing::debug!(
                    vehicle = vehicle.name(),
                    %source,
                    strategy = ?self.config.impossible_strategy,
                    "no new route; restricting the current one"
                );
                let model = self.router.plant().snapshot();
                let refreshed = update_path_locks(&model, &unfinished);
                let marked = mark_restricted_steps(refreshed, self.config.impossible_strategy, source);
                (marked, RerouteOutcome::Restricted)
            }
        };

        self.adjust_first_drive_order(&mut new_orders, vehicle, &original, source)?;
        self.update_transport_order(&original, new_orders, vehicle, controller.as_ref())?;
        Ok(outcome)
    }

    /// Where the new route has to start.
    pub fn reroute_source(
        &self,
        vehicle: &VehicleState,
        controller: &dyn VehicleController,
    ) -> RerouteResult<PointId> {
        if let Some(last) = controller.commands_sent().last() {
            return Ok(last.step.destination);
        }
        if let Some(point) = vehicle.current_position {
            return Ok(point);
        }
        if let Some(pos) = vehicle.precise_position {
            let model = self.router.plant().snapshot();
            if let Some(point) = model.snap_to_point(pos) {
                let offset_mm = model.point(point).map_or(0.0, |p| pos.distance_mm(p.position));
                tracing::debug!(
                    vehicle = vehicle.name(),
                    %point,
                    offset_mm,
                    "reroute source snapped from precise position"
                );
                return Ok(point);
            }
        }
        Err(RerouteError::UnknownPosition(vehicle.name().to_owned()))
    }

    /// New routes for `orders` starting at `source`, or `None` if any leg is
    /// unreachable.  Every new step is tagged as regular rerouting.
    fn try_reroute(
        &self,
        vehicle: &VehicleProfile,
        source: PointId,
        orders: &[DriveOrder],
    ) -> RerouteResult<Option<Vec<DriveOrder>>> {
        let destinations: Vec<PointId> = orders.iter().map(|o| o.destination.point).collect();
        let Some(routes) = self.router.route_drive_orders(vehicle, source, &destinations)? else {
            return Ok(None);
        };
        let rerouted = orders
            .iter()
            .zip(routes)
            .map(|(order, route)| {
                let steps = route
                    .steps
                    .iter()
                    .map(|s| s.with_rerouting_type(Some(ReroutingType::Regular)))
                    .collect();
                order.with_route(Route::new(steps, route.costs))
            })
            .collect();
        Ok(Some(rerouted))
    }

    fn adjust_first_drive_order(
        &self,
        new_orders: &mut [DriveOrder],
        vehicle: &VehicleState,
        original: &TransportOrder,
        source: PointId,
    ) -> RerouteResult<()> {
        if vehicle.proc_state != ProcState::ProcessingOrder {
            return Ok(());
        }
        let (Some(current), Some(first)) = (original.current_drive_order(), new_orders.first_mut()) else {
            return Ok(());
        };
        if current.final_destination() == Some(source) {
            // Every command of the current drive order has been sent already.
            tracing::debug!(vehicle = vehicle.name(), "keeping the current drive order");
            *first = current.clone();
        } else {
            *first = merge_drive_orders(&self.router, &vehicle.profile, current, first)?;
        }
        Ok(())
    }

    fn update_transport_order(
        &self,
        original: &TransportOrder,
        new_orders: Vec<DriveOrder>,
        vehicle: &VehicleState,
        controller: &dyn VehicleController,
    ) -> RerouteResult<()> {
        let drive_orders: Vec<DriveOrder> = original
            .past_drive_orders()
            .iter()
            .cloned()
            .chain(new_orders)
            .collect();
        tracing::debug!(order = %original.name, drive_orders = drive_orders.len(), "updating transport order");
        let routes: Vec<Route> = drive_orders.iter().filter_map(|o| o.route.clone()).collect();
        self.orders.update_drive_orders(&original.name, drive_orders)?;

        if vehicle.proc_state == ProcState::ProcessingOrder {
            let updated = self
                .orders
                .transport_order(&original.name)
                .ok_or_else(|| RerouteError::UnknownTransportOrder(original.name.clone()))?;
            controller.set_transport_order(&updated);
        }

        self.router.select_route(vehicle.profile.id, routes);
        Ok(())
    }
}
