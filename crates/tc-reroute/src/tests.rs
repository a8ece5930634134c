//! Unit tests for tc-reroute.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use tc_core::{
        Orientation, PathId, PointId, Position, ReroutingConfig, ReroutingImpossibleStrategy,
        RouterConfig, VehicleId, VehicleProfile,
    };
    use tc_plant::{PlantModelBuilder, PlantStore};
    use tc_routing::{Route, Router, Step};

    use crate::{
        DriveOrder, Destination, InMemoryControllerPool, InMemoryTransportOrderService,
        InMemoryVehicleController, MovementCommand, RerouteEngine,
    };

    /// ```text
    ///   A --ab--> B --bc--> C --cd--> D --da--> A
    ///              \                 ^
    ///               bx (1500)   xd (1500)
    ///                 \             /
    ///                  `--> X -----'
    /// ```
    ///
    /// Straight segments are 1000 long, so A→D normally runs through C.
    pub struct Detour {
        pub store:  Arc<PlantStore>,
        pub a:      PointId,
        pub b:      PointId,
        pub c:      PointId,
        pub d:      PointId,
        pub x:      PointId,
        pub bc:     PathId,
    }

    pub fn detour() -> Detour {
        let mut bld = PlantModelBuilder::new();
        let a = bld.add_point("A", Position::new(0.0, 0.0));
        let b = bld.add_point("B", Position::new(1_000.0, 0.0));
        let c = bld.add_point("C", Position::new(2_000.0, 0.0));
        let d = bld.add_point("D", Position::new(3_000.0, 0.0));
        let x = bld.add_point("X", Position::new(2_000.0, 1_000.0));
        bld.add_path("A-->B", a, b, 1_000);
        let bc = bld.add_path("B-->C", b, c, 1_000);
        bld.add_path("C-->D", c, d, 1_000);
        bld.add_path("B-->X", b, x, 1_500);
        bld.add_path("X-->D", x, d, 1_500);
        bld.add_path("D-->A", d, a, 3_000);
        Detour {
            store: Arc::new(PlantStore::new(bld.build().unwrap())),
            a, b, c, d, x, bc,
        }
    }

    pub fn vehicle() -> VehicleProfile {
        VehicleProfile::new(VehicleId(0), "AGV-01")
    }

    pub struct Fixture {
        pub router:     Arc<Router>,
        pub orders:     Arc<InMemoryTransportOrderService>,
        pub pool:       Arc<InMemoryControllerPool>,
        pub controller: Arc<InMemoryVehicleController>,
        pub engine:     RerouteEngine,
    }

    pub fn fixture(store: &Arc<PlantStore>, strategy: ReroutingImpossibleStrategy) -> Fixture {
        let router = Arc::new(Router::new(Arc::clone(store), RouterConfig::default()));
        let orders = Arc::new(InMemoryTransportOrderService::new());
        let pool = Arc::new(InMemoryControllerPool::new());
        let controller = Arc::new(InMemoryVehicleController::new());
        pool.attach(vehicle().name, controller.clone());
        let engine = RerouteEngine::new(
            Arc::clone(&router),
            orders.clone(),
            pool.clone(),
            ReroutingConfig { impossible_strategy: strategy },
        );
        Fixture { router, orders, pool, controller, engine }
    }

    /// A drive order to `to`, routed from `from` with the current plant.
    pub fn routed(router: &Router, from: PointId, to: PointId) -> DriveOrder {
        let route = router.compute_route(&vehicle(), from, to).unwrap().unwrap();
        DriveOrder::new(Destination::move_to(to)).with_route(route)
    }

    pub fn send_steps(controller: &InMemoryVehicleController, order: &DriveOrder, count: usize) {
        for step in order.steps().iter().take(count) {
            controller.send(MovementCommand::new(step.clone()));
        }
    }

    pub fn points(order: &DriveOrder) -> Vec<PointId> {
        order.route.as_ref().map(Route::points).unwrap_or_default()
    }

    pub fn indices(order: &DriveOrder) -> Vec<u32> {
        order.steps().iter().map(|s| s.route_index).collect()
    }

    pub fn step(path: u32, from: u32, to: u32, index: u32) -> Step {
        Step::new(PathId(path), PointId(from), PointId(to), Orientation::Forward, index)
    }
}

// ── Merging ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod merging {
    use tc_core::PointId;

    use super::helpers::step;
    use crate::merge::merge_steps;
    use crate::RerouteError;

    #[test]
    fn splices_at_first_matching_source() {
        // A=0 B=1 C=2 D=3 X=4
        let old = vec![step(10, 0, 1, 0), step(11, 1, 2, 1), step(12, 2, 3, 2)];
        let new = vec![step(13, 1, 4, 0), step(14, 4, 3, 1)];
        let merged = merge_steps(&old, &new).unwrap();

        let paths: Vec<u32> = merged.iter().map(|s| s.path.0).collect();
        assert_eq!(paths, vec![10, 13, 14]);
        let idx: Vec<u32> = merged.iter().map(|s| s.route_index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn branching_at_start_replaces_everything() {
        let old = vec![step(10, 0, 1, 5), step(11, 1, 2, 6)];
        let new = vec![step(20, 0, 2, 0)];
        let merged = merge_steps(&old, &new).unwrap();
        assert_eq!(merged, vec![step(20, 0, 2, 0)]);
    }

    #[test]
    fn missing_branching_point_is_an_error() {
        let old = vec![step(10, 0, 1, 0)];
        let new = vec![step(20, 7, 1, 0)];
        assert!(matches!(
            merge_steps(&old, &new),
            Err(RerouteError::NoBranchingPoint(PointId(7)))
        ));
    }

    #[test]
    fn empty_replacement_is_an_error() {
        let old = vec![step(10, 0, 1, 0)];
        assert!(matches!(merge_steps(&old, &[]), Err(RerouteError::EmptyReplacement)));
    }

    #[test]
    fn merge_keeps_execution_flags() {
        let old = vec![step(10, 0, 1, 0).with_execution_allowed(false), step(11, 1, 2, 1)];
        let new = vec![step(13, 1, 4, 0)];
        let merged = merge_steps(&old, &new).unwrap();
        assert!(!merged[0].execution_allowed);
        assert!(merged[1].execution_allowed);
    }
}

// ── Fallback marking ──────────────────────────────────────────────────────────

#[cfg(test)]
mod marking {
    use tc_core::{PathId, PointId, Position, ReroutingImpossibleStrategy};
    use tc_plant::PlantModelBuilder;
    use tc_routing::Route;

    use super::helpers::step;
    use crate::marking::{mark_restricted_steps, update_path_locks, ExecutionTest};
    use crate::{Destination, DriveOrder};

    /// X(0) → P1(1), P1 → P2(2) locked, P2 → P3(3).
    fn order() -> DriveOrder {
        let steps = vec![
            step(0, 0, 1, 0),
            step(1, 1, 2, 1).with_path_locked(true),
            step(2, 2, 3, 2),
        ];
        DriveOrder::new(Destination::move_to(PointId(3))).with_route(Route::new(steps, 3_000))
    }

    fn allowed(orders: &[DriveOrder]) -> Vec<bool> {
        orders.iter().flat_map(DriveOrder::steps).map(|s| s.execution_allowed).collect()
    }

    #[test]
    fn lock_refresh_only_touches_lock_flags() {
        let mut b = PlantModelBuilder::new();
        let p0 = b.add_point("P0", Position::new(0.0, 0.0));
        let p1 = b.add_point("P1", Position::new(1_000.0, 0.0));
        let p2 = b.add_point("P2", Position::new(2_000.0, 0.0));
        let a = b.add_path("P0-->P1", p0, p1, 1_000);
        let c = b.add_path("P1-->P2", p1, p2, 1_000);
        let model = b.build().unwrap().with_path_locked(c, true).unwrap();
        assert_eq!((a, c), (PathId(0), PathId(1)));

        let steps = vec![
            step(0, 0, 1, 0).with_path_locked(true).with_execution_allowed(false),
            step(1, 1, 2, 1),
            step(9, 2, 0, 2),
        ];
        let stale = DriveOrder::new(Destination::move_to(PointId(0))).with_route(Route::new(steps, 0));
        let refreshed = update_path_locks(&model, &[stale]);

        let locked: Vec<bool> = refreshed.iter().flat_map(DriveOrder::steps).map(|s| s.path_locked).collect();
        assert_eq!(locked, vec![false, true, true]);
        assert_eq!(allowed(&refreshed), vec![false, true, true]);
    }

    #[test]
    fn pause_at_path_lock() {
        let marked = mark_restricted_steps(vec![order()], ReroutingImpossibleStrategy::PauseAtPathLock, PointId(0));
        assert_eq!(allowed(&marked), vec![true, false, false]);
    }

    #[test]
    fn pause_immediately_from_source() {
        let marked = mark_restricted_steps(vec![order()], ReroutingImpossibleStrategy::PauseImmediately, PointId(1));
        assert_eq!(allowed(&marked), vec![true, false, false]);

        let marked = mark_restricted_steps(vec![order()], ReroutingImpossibleStrategy::PauseImmediately, PointId(0));
        assert_eq!(allowed(&marked), vec![false, false, false]);
    }

    #[test]
    fn ignore_path_locks_changes_nothing() {
        let marked = mark_restricted_steps(vec![order()], ReroutingImpossibleStrategy::IgnorePathLocks, PointId(0));
        assert_eq!(marked, vec![order()]);
    }

    #[test]
    fn unlocked_route_is_left_alone() {
        let steps = vec![step(0, 0, 1, 0).with_execution_allowed(false), step(2, 1, 3, 1)];
        let unlocked = DriveOrder::new(Destination::move_to(PointId(3))).with_route(Route::new(steps, 0));
        let marked = mark_restricted_steps(vec![unlocked.clone()], ReroutingImpossibleStrategy::PauseImmediately, PointId(0));
        assert_eq!(marked, vec![unlocked]);
    }

    #[test]
    fn marking_continues_across_drive_orders() {
        let next = DriveOrder::new(Destination::move_to(PointId(0))).with_route(Route::new(vec![step(5, 3, 0, 0)], 1_000));
        let marked = mark_restricted_steps(vec![order(), next], ReroutingImpossibleStrategy::PauseAtPathLock, PointId(0));
        assert_eq!(allowed(&marked), vec![true, false, false, false]);
    }

    #[test]
    fn execution_test_is_sticky() {
        let mut test = ExecutionTest::new(ReroutingImpossibleStrategy::PauseAtPathLock, PointId(0));
        assert!(test.test(&step(0, 0, 1, 0)));
        assert!(!test.test(&step(1, 1, 2, 1).with_path_locked(true)));
        assert!(!test.test(&step(2, 2, 3, 2)));
    }
}

// ── Orders ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod orders {
    use tc_core::PointId;

    use crate::{Destination, DriveOrder, DriveOrderState, TransportOrder};

    fn order() -> TransportOrder {
        let legs = (0..3).map(|i| DriveOrder::new(Destination::move_to(PointId(i)))).collect();
        TransportOrder::new("t1", legs)
    }

    #[test]
    fn partition_follows_current_index() {
        let mut t = order();
        assert!(t.past_drive_orders().is_empty());
        assert_eq!(t.current_drive_order().unwrap().destination.point, PointId(0));
        assert_eq!(t.future_drive_orders().len(), 2);

        t.advance();
        assert_eq!(t.past_drive_orders().len(), 1);
        assert_eq!(t.past_drive_orders()[0].state, DriveOrderState::Finished);
        assert_eq!(t.current_drive_order().unwrap().state, DriveOrderState::Travelling);
        assert_eq!(t.unfinished_drive_orders().len(), 2);
    }

    #[test]
    fn finished_order_has_no_current() {
        let mut t = order();
        for _ in 0..3 {
            t.advance();
        }
        assert!(t.current_drive_order().is_none());
        assert!(t.future_drive_orders().is_empty());
        assert!(t.unfinished_drive_orders().is_empty());
        assert_eq!(t.past_drive_orders().len(), 3);
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use std::sync::Arc;

    use tc_core::{Position, ReroutingImpossibleStrategy, VehicleId};
    use tc_routing::ReroutingType;

    use super::helpers::{detour, fixture, indices, points, routed, send_steps, vehicle};
    use crate::{
        InMemoryVehicleController, ProcState, RerouteError, RerouteOutcome, TransportOrder,
        TransportOrderService, VehicleState,
    };

    #[test]
    fn merges_new_route_at_branching_point() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        let current = routed(&f.router, p.a, p.d);
        assert_eq!(points(&current), vec![p.a, p.b, p.c, p.d]);
        f.orders.insert(TransportOrder::new("t1", vec![current.clone()]));
        send_steps(&f.controller, &current, 1);

        p.store.set_path_locked(p.bc, true).unwrap();
        let state = VehicleState::new(vehicle()).at(p.a).processing("t1", ProcState::ProcessingOrder);
        assert_eq!(f.engine.reroute(&state).unwrap(), RerouteOutcome::Rerouted);

        let stored = f.orders.transport_order("t1").unwrap();
        let merged = stored.current_drive_order().unwrap();
        assert_eq!(points(merged), vec![p.a, p.b, p.x, p.d]);
        assert_eq!(indices(merged), vec![0, 1, 2]);
        assert_eq!(merged.route.as_ref().unwrap().costs, 4_000);
        let tags: Vec<_> = merged.steps().iter().map(|s| s.rerouting_type).collect();
        assert_eq!(tags, vec![None, Some(ReroutingType::Regular), Some(ReroutingType::Regular)]);

        // The controller and the router see the new plan.
        assert_eq!(f.controller.transport_order(), Some(stored.clone()));
        let selected = f.router.selected_route(VehicleId(0)).unwrap();
        assert_eq!(selected, vec![merged.route.clone().unwrap()]);
    }

    #[test]
    fn past_drive_orders_are_preserved() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        let past = routed(&f.router, p.a, p.b);
        let current = routed(&f.router, p.b, p.d);
        let future = routed(&f.router, p.d, p.a);
        let mut order = TransportOrder::new("t1", vec![past, current, future]);
        order.advance();
        let past_before = order.past_drive_orders().to_vec();
        f.orders.insert(order);

        p.store.set_path_locked(p.bc, true).unwrap();
        let state = VehicleState::new(vehicle()).at(p.b).processing("t1", ProcState::ProcessingOrder);
        assert_eq!(f.engine.reroute(&state).unwrap(), RerouteOutcome::Rerouted);

        let stored = f.orders.transport_order("t1").unwrap();
        assert_eq!(stored.drive_orders().len(), 3);
        assert_eq!(stored.past_drive_orders(), past_before.as_slice());
        assert_eq!(points(stored.current_drive_order().unwrap()), vec![p.b, p.x, p.d]);
        assert_eq!(points(&stored.future_drive_orders()[0]), vec![p.d, p.a]);
    }

    #[test]
    fn current_order_is_kept_when_all_commands_are_sent() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        let current = routed(&f.router, p.a, p.d);
        let future = routed(&f.router, p.d, p.a);
        f.orders.insert(TransportOrder::new("t1", vec![current.clone(), future]));
        send_steps(&f.controller, &current, 3);

        let state = VehicleState::new(vehicle()).at(p.b).processing("t1", ProcState::ProcessingOrder);
        assert_eq!(f.engine.reroute(&state).unwrap(), RerouteOutcome::Rerouted);

        let stored = f.orders.transport_order("t1").unwrap();
        assert_eq!(stored.current_drive_order(), Some(&current));
        let next = &stored.future_drive_orders()[0];
        assert_eq!(points(next), vec![p.d, p.a]);
        assert!(next.steps().iter().all(|s| s.rerouting_type == Some(ReroutingType::Regular)));
    }

    #[test]
    fn unreachable_destination_restricts_current_route() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        // Once at C, the only way on is C-->D; lock it after routing.
        let current = routed(&f.router, p.b, p.d);
        f.orders.insert(TransportOrder::new("t1", vec![current.clone()]));
        let cd = current.steps()[1].path;
        p.store.set_path_locked(cd, true).unwrap();

        let state = VehicleState::new(vehicle()).at(p.c).processing("t1", ProcState::AwaitingOrder);
        assert_eq!(f.engine.reroute(&state).unwrap(), RerouteOutcome::Restricted);

        let stored = f.orders.transport_order("t1").unwrap();
        let kept = stored.current_drive_order().unwrap();
        assert_eq!(points(kept), vec![p.b, p.c, p.d]);
        let locked: Vec<bool> = kept.steps().iter().map(|s| s.path_locked).collect();
        assert_eq!(locked, vec![false, true]);
        let allowed: Vec<bool> = kept.steps().iter().map(|s| s.execution_allowed).collect();
        assert_eq!(allowed, vec![true, false]);
        // Not processing a drive order: the controller is not updated.
        assert!(f.controller.transport_order().is_none());
    }

    #[test]
    fn ignore_path_locks_only_refreshes_flags() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::IgnorePathLocks);
        let current = routed(&f.router, p.b, p.d);
        f.orders.insert(TransportOrder::new("t1", vec![current.clone()]));
        let cd = current.steps()[1].path;
        p.store.set_path_locked(cd, true).unwrap();

        let state = VehicleState::new(vehicle()).at(p.c).processing("t1", ProcState::AwaitingOrder);
        assert_eq!(f.engine.reroute(&state).unwrap(), RerouteOutcome::Restricted);
        let stored = f.orders.transport_order("t1").unwrap();
        let kept = stored.current_drive_order().unwrap();
        assert!(kept.steps().iter().all(|s| s.execution_allowed));
        assert!(kept.steps()[1].path_locked);
    }

    #[test]
    fn missing_branching_point_leaves_everything_untouched() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        let current = routed(&f.router, p.a, p.d);
        let original = TransportOrder::new("t1", vec![current]);
        f.orders.insert(original.clone());

        // Reported at X, which the current route never leaves from.
        let state = VehicleState::new(vehicle()).at(p.x).processing("t1", ProcState::ProcessingOrder);
        let result = f.engine.reroute(&state);
        assert!(matches!(result, Err(RerouteError::NoBranchingPoint(pt)) if pt == p.x));

        assert_eq!(f.orders.transport_order("t1"), Some(original));
        assert!(f.controller.transport_order().is_none());
        assert!(f.router.selected_route(VehicleId(0)).is_none());
    }

    #[test]
    fn vehicle_without_order_is_skipped() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        let state = VehicleState::new(vehicle()).at(p.a);
        assert_eq!(f.engine.reroute(&state).unwrap(), RerouteOutcome::NotProcessingOrder);
    }

    #[test]
    fn unknown_order_and_controller() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        let state = VehicleState::new(vehicle()).at(p.a).processing("nope", ProcState::ProcessingOrder);
        assert!(matches!(f.engine.reroute(&state), Err(RerouteError::UnknownTransportOrder(_))));

        f.orders.insert(TransportOrder::new("t1", vec![routed(&f.router, p.a, p.d)]));
        f.pool.detach(&vehicle().name);
        let state = VehicleState::new(vehicle()).at(p.a).processing("t1", ProcState::ProcessingOrder);
        assert!(matches!(f.engine.reroute(&state), Err(RerouteError::NoController(_))));
    }

    #[test]
    fn reroute_source_precedence() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        let controller = InMemoryVehicleController::new();

        let snapped = VehicleState::new(vehicle()).at_position(Position::new(2_010.0, 5.0));
        assert_eq!(f.engine.reroute_source(&snapped, &controller).unwrap(), p.c);

        let reported = snapped.clone().at(p.a);
        assert_eq!(f.engine.reroute_source(&reported, &controller).unwrap(), p.a);

        send_steps(&controller, &routed(&f.router, p.a, p.d), 2);
        assert_eq!(f.engine.reroute_source(&reported, &controller).unwrap(), p.c);

        let lost = VehicleState::new(vehicle());
        let empty = InMemoryVehicleController::new();
        assert!(matches!(
            f.engine.reroute_source(&lost, &empty),
            Err(RerouteError::UnknownPosition(_))
        ));
    }

    #[test]
    fn reroute_all_reports_each_vehicle() {
        let p = detour();
        let f = fixture(&p.store, ReroutingImpossibleStrategy::PauseAtPathLock);
        f.orders.insert(TransportOrder::new("t1", vec![routed(&f.router, p.a, p.d)]));
        f.pool.attach("AGV-02", Arc::new(InMemoryVehicleController::new()));

        let mut second = vehicle();
        second.id = VehicleId(1);
        second.name = "AGV-02".to_owned();
        let vehicles = vec![
            VehicleState::new(vehicle()).at(p.a).processing("t1", ProcState::ProcessingOrder),
            VehicleState::new(second).at(p.a),
        ];

        let results = f.engine.reroute_all(&vehicles);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, VehicleId(0));
        assert_eq!(*results[0].1.as_ref().unwrap(), RerouteOutcome::Rerouted);
        assert_eq!(*results[1].1.as_ref().unwrap(), RerouteOutcome::NotProcessingOrder);
    }
}
