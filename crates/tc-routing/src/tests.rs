//! Unit tests for tc-routing.
//!
//! All tests use a hand-crafted plant so they run without any model file.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use tc_core::{PathId, PointId, Position, RouterConfig, VehicleId, VehicleProfile};
    use tc_plant::{PlantModel, PlantModelBuilder, PlantStore};

    use crate::Router;

    /// Small grid plant, every path bidirectional.
    ///
    /// Points (x, y in mm):
    ///   P0:(0,0)     P1:(1000,0)  P2:(2000,0)
    ///   P3:(0,1000)               P4:(2000,1000)
    ///
    /// Paths (source-destination, length):
    ///   p01 P0-P1 1000,  p12 P1-P2 1000,  p24 P2-P4 1000,
    ///   p03 P0-P3 5000,  p34 P3-P4 1000
    ///
    /// Shortest P0→P4 by distance: P0→P1→P2→P4 (3000) vs P0→P3→P4 (6000).
    pub fn grid_builder() -> (PlantModelBuilder, [PointId; 5], [PathId; 5]) {
        let mut b = PlantModelBuilder::new();
        let p0 = b.add_point("P0", Position::new(0.0, 0.0));
        let p1 = b.add_point("P1", Position::new(1_000.0, 0.0));
        let p2 = b.add_point("P2", Position::new(2_000.0, 0.0));
        let p3 = b.add_point("P3", Position::new(0.0, 1_000.0));
        let p4 = b.add_point("P4", Position::new(2_000.0, 1_000.0));

        let p01 = b.add_bidirectional_path("P0--P1", p0, p1, 1_000);
        let p12 = b.add_bidirectional_path("P1--P2", p1, p2, 1_000);
        let p24 = b.add_bidirectional_path("P2--P4", p2, p4, 1_000);
        let p03 = b.add_bidirectional_path("P0--P3", p0, p3, 5_000);
        let p34 = b.add_bidirectional_path("P3--P4", p3, p4, 1_000);

        (b, [p0, p1, p2, p3, p4], [p01, p12, p24, p03, p34])
    }

    pub fn grid_plant() -> (PlantModel, [PointId; 5], [PathId; 5]) {
        let (b, points, paths) = grid_builder();
        (b.build().unwrap(), points, paths)
    }

    pub fn router_for(model: PlantModel) -> (Arc<PlantStore>, Router) {
        let store = Arc::new(PlantStore::new(model));
        let router = Router::new(Arc::clone(&store), RouterConfig::default());
        (store, router)
    }

    pub fn vehicle(id: u32) -> VehicleProfile {
        VehicleProfile::new(VehicleId(id), format!("Vehicle-{id:02}"))
    }
}

// ── Shortest routes ───────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use tc_core::{Orientation, PointId, Position};
    use tc_plant::PlantModelBuilder;

    use super::helpers::{grid_builder, grid_plant, router_for, vehicle};
    use crate::{RoutingError, INFINITE_COSTS};

    #[test]
    fn same_point_is_empty_route() {
        let (model, [p0, ..], _) = grid_plant();
        let (_, router) = router_for(model);
        let route = router.compute_route(&vehicle(0), p0, p0).unwrap().unwrap();
        assert!(route.is_empty());
        assert_eq!(route.costs, 0);
        assert_eq!(router.costs(&vehicle(0), p0, p0).unwrap(), 0);
    }

    #[test]
    fn shortest_route_by_distance() {
        let (model, [p0, p1, p2, _, p4], [p01, p12, p24, ..]) = grid_plant();
        let (_, router) = router_for(model);
        let route = router.compute_route(&vehicle(0), p0, p4).unwrap().unwrap();

        assert_eq!(route.costs, 3_000);
        assert_eq!(route.points(), vec![p0, p1, p2, p4]);
        let paths: Vec<_> = route.steps.iter().map(|s| s.path).collect();
        assert_eq!(paths, vec![p01, p12, p24]);
        let indices: Vec<_> = route.steps.iter().map(|s| s.route_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(route.steps.iter().all(|s| s.orientation == Orientation::Forward));
        assert!(route.steps.iter().all(|s| s.execution_allowed));
    }

    #[test]
    fn reverse_travel_uses_backward_orientation() {
        let (model, [p0, p1, p2, _, p4], _) = grid_plant();
        let (_, router) = router_for(model);
        let route = router.compute_route(&vehicle(0), p4, p0).unwrap().unwrap();
        assert_eq!(route.points(), vec![p4, p2, p1, p0]);
        assert!(route.steps.iter().all(|s| s.orientation == Orientation::Backward));
    }

    #[test]
    fn repeated_queries_are_identical() {
        let (model, [p0, _, _, p3, p4], _) = grid_plant();
        let (_, router) = router_for(model);
        let v = vehicle(0);
        let first = router.compute_route(&v, p3, p4).unwrap();
        for _ in 0..5 {
            assert_eq!(router.compute_route(&v, p3, p4).unwrap(), first);
        }
        let a = router.compute_route(&v, p0, p4).unwrap();
        assert_eq!(router.compute_route(&v, p0, p4).unwrap(), a);
    }

    #[test]
    fn one_way_path_not_travelled_backward() {
        let mut b = PlantModelBuilder::new();
        let a = b.add_point("A", Position::new(0.0, 0.0));
        let c = b.add_point("C", Position::new(1_000.0, 0.0));
        b.add_path("A-->C", a, c, 1_000);
        let (_, router) = router_for(b.build().unwrap());
        assert!(router.compute_route(&vehicle(0), a, c).unwrap().is_some());
        assert!(router.compute_route(&vehicle(0), c, a).unwrap().is_none());
    }

    #[test]
    fn zero_velocity_direction_is_omitted() {
        let (mut b, [p0, p1, ..], [p01, ..]) = grid_builder();
        b.set_velocities(p01, 0, 1_000);
        let (_, router) = router_for(b.build().unwrap());
        // P0→P1 must detour via P3, P4, P2.
        let route = router.compute_route(&vehicle(0), p0, p1).unwrap().unwrap();
        assert_eq!(route.costs, 5_000 + 1_000 + 1_000 + 1_000);
        // Reverse direction still allowed.
        let back = router.compute_route(&vehicle(0), p1, p0).unwrap().unwrap();
        assert_eq!(back.costs, 1_000);
    }

    #[test]
    fn disconnected_destination_is_none() {
        let (mut b, [p0, ..], _) = grid_builder();
        let island = b.add_point("Island", Position::new(9_000.0, 9_000.0));
        let (_, router) = router_for(b.build().unwrap());
        assert!(router.compute_route(&vehicle(0), p0, island).unwrap().is_none());
        assert_eq!(router.costs(&vehicle(0), p0, island).unwrap(), INFINITE_COSTS);
    }

    #[test]
    fn unknown_point_is_an_error() {
        let (model, [p0, ..], _) = grid_plant();
        let (_, router) = router_for(model);
        let result = router.compute_route(&vehicle(0), p0, PointId(42));
        assert!(matches!(result, Err(RoutingError::UnknownPoint(PointId(42)))));
    }

    #[test]
    fn locked_path_at_build_time_is_skipped() {
        let (mut b, [p0, _, _, _, p4], [_, p12, ..]) = grid_builder();
        b.set_locked(p12, true);
        let (_, router) = router_for(b.build().unwrap());
        let route = router.compute_route(&vehicle(0), p0, p4).unwrap().unwrap();
        assert_eq!(route.costs, 6_000);
        assert!(route.steps.iter().all(|s| s.path != p12));
    }
}

// ── Batched and derived queries ───────────────────────────────────────────────

#[cfg(test)]
mod batched {
    use tc_core::{Position, VehicleId};

    use super::helpers::{grid_builder, grid_plant, router_for, vehicle};
    use crate::INFINITE_COSTS;

    #[test]
    fn compute_routes_one_tree() {
        let (mut b, [p0, _, p2, _, p4], _) = grid_builder();
        let island = b.add_point("Island", Position::new(9_000.0, 9_000.0));
        let (_, router) = router_for(b.build().unwrap());

        let routes = router.compute_routes(&vehicle(0), p0, &[p2, p4, island, p0]).unwrap();
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[&p2].costs, 2_000);
        assert_eq!(routes[&p4].costs, 3_000);
        assert!(routes[&p0].is_empty());
        assert!(!routes.contains_key(&island));
    }

    #[test]
    fn drive_order_legs_are_chained() {
        let (model, [p0, _, p2, p3, p4], _) = grid_plant();
        let (_, router) = router_for(model);
        let legs = router
            .route_drive_orders(&vehicle(0), p0, &[p2, p3])
            .unwrap()
            .unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].final_destination(), Some(p2));
        assert_eq!(legs[1].source_point(), Some(p2));
        assert_eq!(legs[1].points(), vec![p2, p4, p3]);
    }

    #[test]
    fn drive_order_with_unreachable_leg_is_none() {
        let (mut b, [p0, _, p2, ..], _) = grid_builder();
        let island = b.add_point("Island", Position::new(9_000.0, 9_000.0));
        let (_, router) = router_for(b.build().unwrap());
        let legs = router.route_drive_orders(&vehicle(0), p0, &[p2, island]).unwrap();
        assert!(legs.is_none());
    }

    #[test]
    fn avoiding_points_detours_without_caching() {
        let (model, [p0, p1, _, p3, p4], _) = grid_plant();
        let (_, router) = router_for(model);
        let route = router
            .compute_route_avoiding(&vehicle(0), p0, p4, &[p1])
            .unwrap()
            .unwrap();
        assert_eq!(route.points(), vec![p0, p3, p4]);
        assert_eq!(router.point_router_count(), 0);

        // The cached graph is untouched by the exclusion.
        let normal = router.compute_route(&vehicle(0), p0, p4).unwrap().unwrap();
        assert_eq!(normal.costs, 3_000);
    }

    #[test]
    fn avoiding_the_source_leaves_no_route() {
        let (model, [p0, _, _, _, p4], _) = grid_plant();
        let (_, router) = router_for(model);
        let route = router.compute_route_avoiding(&vehicle(0), p0, p4, &[p0]).unwrap();
        assert!(route.is_none());
    }

    #[test]
    fn candidates_ranked_by_cost() {
        let (mut b, [p0, _, p2, p3, p4], _) = grid_builder();
        let island = b.add_point("Island", Position::new(9_000.0, 9_000.0));
        let (_, router) = router_for(b.build().unwrap());

        let candidates = vec![
            (vehicle(1), p0),
            (vehicle(2), island),
            (vehicle(3), p2),
            (vehicle(4), p3),
        ];
        let ranked = router.costs_from_many(&candidates, p4).unwrap();
        assert_eq!(
            ranked,
            vec![
                (VehicleId(3), 1_000),
                (VehicleId(4), 1_000),
                (VehicleId(1), 3_000),
                (VehicleId(2), INFINITE_COSTS),
            ]
        );
    }

    #[test]
    fn selected_routes_are_recorded() {
        let (model, [p0, _, _, _, p4], _) = grid_plant();
        let (_, router) = router_for(model);
        let v = vehicle(7);
        assert!(router.selected_route(v.id).is_none());

        let route = router.compute_route(&v, p0, p4).unwrap().unwrap();
        router.select_route(v.id, vec![route.clone()]);
        assert_eq!(router.selected_route(v.id), Some(vec![route]));

        router.clear_selected_route(v.id);
        assert!(router.selected_route(v.id).is_none());
    }
}

// ── Routing groups & cache ────────────────────────────────────────────────────

#[cfg(test)]
mod groups {
    use std::sync::Arc;

    use super::helpers::{grid_builder, grid_plant, router_for, vehicle};

    #[test]
    fn group_tagged_path_only_for_that_group() {
        let (mut b, [p0, _, _, _, p4], [_, p12, ..]) = grid_builder();
        b.set_path_groups(p12, &["narrow"]);
        let (_, router) = router_for(b.build().unwrap());

        let plain = vehicle(0);
        let narrow = vehicle(1).with_routing_group("narrow");
        assert_eq!(router.costs(&plain, p0, p4).unwrap(), 6_000);
        assert_eq!(router.costs(&narrow, p0, p4).unwrap(), 3_000);
        assert_eq!(router.point_router_count(), 2);
    }

    #[test]
    fn one_point_router_per_group() {
        let (model, [p0, _, _, _, p4], _) = grid_plant();
        let (_, router) = router_for(model);

        router.compute_route(&vehicle(0), p0, p4).unwrap();
        router.compute_route(&vehicle(1), p0, p4).unwrap();
        // Blank group resolves to the default group.
        router.compute_route(&vehicle(2).with_routing_group("  "), p0, p4).unwrap();
        assert_eq!(router.point_router_count(), 1);

        router.compute_route(&vehicle(3).with_routing_group("heavy"), p0, p4).unwrap();
        assert_eq!(router.point_router_count(), 2);
    }

    #[test]
    fn lock_change_rebuilds_graph_copy_on_write() {
        let (model, [p0, _, _, _, p4], [_, p12, ..]) = grid_plant();
        let (store, router) = router_for(model);
        let v = vehicle(0);

        let before = router.point_router(&v);
        assert_eq!(before.costs(p0, p4), 3_000);

        store.set_path_locked(p12, true).unwrap();
        let after = router.point_router(&v);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.costs(p0, p4), 6_000);
        // The stale router still answers against its own snapshot.
        assert_eq!(before.costs(p0, p4), 3_000);

        store.set_path_locked(p12, false).unwrap();
        assert_eq!(router.costs(&v, p0, p4).unwrap(), 3_000);
    }

    #[test]
    fn unchanged_plant_reuses_cached_router() {
        let (model, _, _) = grid_plant();
        let (_, router) = router_for(model);
        let v = vehicle(0);
        let a = router.point_router(&v);
        let b = router.point_router(&v);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn invalidate_clears_cache() {
        let (model, [p0, _, _, _, p4], _) = grid_plant();
        let (_, router) = router_for(model);
        router.compute_route(&vehicle(0), p0, p4).unwrap();
        assert_eq!(router.point_router_count(), 1);
        router.invalidate();
        assert_eq!(router.point_router_count(), 0);
        assert_eq!(router.costs(&vehicle(0), p0, p4).unwrap(), 3_000);
    }
}

// ── Algorithms ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod algorithms {
    use std::sync::Arc;

    use tc_core::{RouterConfig, RoutingAlgorithm};
    use tc_plant::PlantStore;

    use super::helpers::{grid_plant, vehicle};
    use crate::Router;

    #[test]
    fn bellman_ford_matches_dijkstra_costs() {
        let (model, points, _) = grid_plant();
        let store = Arc::new(PlantStore::new(model));
        let dijkstra = Router::new(Arc::clone(&store), RouterConfig::default());
        let bellman_ford = Router::new(
            Arc::clone(&store),
            RouterConfig { algorithm: RoutingAlgorithm::BellmanFord, ..RouterConfig::default() },
        );
        let v = vehicle(0);
        for &from in &points {
            for &to in &points {
                assert_eq!(
                    dijkstra.costs(&v, from, to).unwrap(),
                    bellman_ford.costs(&v, from, to).unwrap(),
                    "{from} -> {to}"
                );
            }
        }
        let route = bellman_ford.compute_route(&v, points[0], points[4]).unwrap().unwrap();
        assert_eq!(route.points(), vec![points[0], points[1], points[2], points[4]]);
    }
}

// ── Edge evaluators ───────────────────────────────────────────────────────────

#[cfg(test)]
mod evaluators {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rustc_hash::FxHashSet;
    use tc_core::{EvaluatorKind, Orientation, RouterConfig, VehicleProfile};
    use tc_plant::{Path, PlantStore};

    use super::helpers::{grid_builder, grid_plant, vehicle};
    use crate::{
        EdgeEvaluator, EdgeEvaluatorExt, EvaluatorComposite, EvaluatorDistance,
        EvaluatorExplicitPenalties, EvaluatorHops, EvaluatorTravelTime, Router, RoutingGraph,
        INFINITE_COSTS,
    };

    fn first_path() -> Path {
        let (model, _, _) = grid_plant();
        model.paths[0].clone()
    }

    #[test]
    fn travel_time_uses_slower_limit() {
        let path = first_path(); // 1000 mm at 1000 mm/s both ways
        let fast = vehicle(0);
        let slow = vehicle(1).with_velocities(500, 250);
        assert_eq!(EvaluatorTravelTime.evaluate(&path, Orientation::Forward, &fast), 1_000);
        assert_eq!(EvaluatorTravelTime.evaluate(&path, Orientation::Forward, &slow), 2_000);
        assert_eq!(EvaluatorTravelTime.evaluate(&path, Orientation::Backward, &slow), 4_000);
    }

    #[test]
    fn travel_time_infinite_when_vehicle_cannot_reverse() {
        let path = first_path();
        let no_reverse = vehicle(0).with_velocities(1_000, 0);
        assert_eq!(
            EvaluatorTravelTime.evaluate(&path, Orientation::Backward, &no_reverse),
            INFINITE_COSTS
        );
    }

    #[test]
    fn infinite_edges_are_dropped_from_graph() {
        let (model, _, _) = grid_plant();
        let no_reverse = vehicle(0).with_velocities(1_000, 0);
        let graph = RoutingGraph::build(
            &model,
            "",
            &no_reverse,
            &EvaluatorTravelTime,
            &FxHashSet::default(),
        );
        assert_eq!(graph.edge_count(), model.path_count());
        assert!(graph.edge_orientation.iter().all(|&o| o == Orientation::Forward));
    }

    #[test]
    fn graph_edges_follow_incident_paths() {
        let (model, _, _) = grid_plant();
        let graph = RoutingGraph::build(&model, "", &vehicle(0), &EvaluatorDistance, &FxHashSet::default());
        assert_eq!(graph.edge_count(), 2 * model.path_count());

        for point in model.points.iter().map(|p| p.id) {
            let edges = graph.out_edges(point);
            assert!(edges.clone().all(|e| graph.edge_from[e] == point));
            let paths: Vec<_> = edges.map(|e| graph.edge_path[e]).collect();
            let mut sorted = paths.clone();
            sorted.sort();
            assert_eq!(paths, sorted, "edges of {point} out of path order");
            assert!(paths.iter().all(|p| model.incident_paths(point).contains(p)));
        }
    }

    #[test]
    fn penalties_and_hops() {
        let (mut b, _, [p01, ..]) = grid_builder();
        b.set_penalties(p01, 7, 11);
        let model = b.build().unwrap();
        let path = model.path(p01).unwrap();
        let v = vehicle(0);
        assert_eq!(EvaluatorExplicitPenalties.evaluate(path, Orientation::Forward, &v), 7);
        assert_eq!(EvaluatorExplicitPenalties.evaluate(path, Orientation::Backward, &v), 11);
        assert_eq!(EvaluatorHops.evaluate(path, Orientation::Forward, &v), 1);
    }

    #[test]
    fn plus_sums_and_saturates() {
        let path = first_path();
        let v = vehicle(0);
        let summed = EvaluatorDistance.plus(EvaluatorHops);
        assert_eq!(summed.evaluate(&path, Orientation::Forward, &v), 1_001);

        let no_reverse = vehicle(1).with_velocities(1_000, 0);
        let with_infinite = EvaluatorHops.plus(EvaluatorTravelTime);
        assert_eq!(
            with_infinite.evaluate(&path, Orientation::Backward, &no_reverse),
            INFINITE_COSTS
        );
    }

    #[test]
    fn composite_from_config() {
        let path = first_path();
        let v = vehicle(0);
        let empty = EvaluatorComposite::from_config(&[]);
        assert_eq!(empty.len(), 1);
        assert_eq!(empty.evaluate(&path, Orientation::Forward, &v), 1_000);

        let mixed = EvaluatorComposite::from_config(&[
            EvaluatorKind::Distance,
            EvaluatorKind::TravelTime,
            EvaluatorKind::Hops,
        ]);
        assert_eq!(mixed.evaluate(&path, Orientation::Forward, &v), 1_000 + 1_000 + 1);
    }

    #[test]
    fn hops_config_prefers_fewest_paths() {
        let (model, [p0, _, _, p3, p4], _) = grid_plant();
        let store = Arc::new(PlantStore::new(model));
        let router = Router::new(
            store,
            RouterConfig { evaluators: vec![EvaluatorKind::Hops], ..RouterConfig::default() },
        );
        let route = router.compute_route(&vehicle(0), p0, p4).unwrap().unwrap();
        assert_eq!(route.costs, 2);
        assert_eq!(route.points(), vec![p0, p3, p4]);
    }

    #[derive(Default)]
    struct CountingEvaluator {
        starts:      AtomicUsize,
        ends:        AtomicUsize,
        evaluations: AtomicUsize,
    }

    impl EdgeEvaluator for CountingEvaluator {
        fn on_graph_computation_start(&self, _vehicle: &VehicleProfile) {
            self.starts.fetch_add(1, Ordering::Relaxed);
        }

        fn on_graph_computation_end(&self, _vehicle: &VehicleProfile) {
            self.ends.fetch_add(1, Ordering::Relaxed);
        }

        fn evaluate(&self, path: &Path, _o: Orientation, _v: &VehicleProfile) -> u64 {
            self.evaluations.fetch_add(1, Ordering::Relaxed);
            path.length_mm
        }
    }

    #[test]
    fn lifecycle_hooks_wrap_each_build() {
        let (model, [p0, _, _, _, p4], _) = grid_plant();
        let store = Arc::new(PlantStore::new(model));
        let counting = Arc::new(CountingEvaluator::default());
        let router = Router::with_evaluator(store, RouterConfig::default(), counting.clone());

        router.compute_route(&vehicle(0), p0, p4).unwrap();
        router.compute_route(&vehicle(0), p4, p0).unwrap();
        assert_eq!(counting.starts.load(Ordering::Relaxed), 1);
        assert_eq!(counting.ends.load(Ordering::Relaxed), 1);
        // 5 bidirectional paths → 10 evaluated directions.
        assert_eq!(counting.evaluations.load(Ordering::Relaxed), 10);
    }
}

// ── Route values ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod values {
    use tc_core::{Orientation, PathId, PointId};

    use crate::{ReroutingType, Route, Step};

    #[test]
    fn with_functions_leave_original_untouched() {
        let step = Step::new(PathId(1), PointId(0), PointId(1), Orientation::Forward, 0);
        let paused = step.with_execution_allowed(false);
        let moved = step.with_route_index(4).with_rerouting_type(Some(ReroutingType::Regular));

        assert!(step.execution_allowed);
        assert!(!paused.execution_allowed);
        assert_eq!(moved.route_index, 4);
        assert_eq!(moved.rerouting_type, Some(ReroutingType::Regular));
        assert_eq!(step.route_index, 0);
        assert!(step.with_path_locked(true).path_locked);
    }

    #[test]
    fn route_endpoints() {
        let steps = vec![
            Step::new(PathId(0), PointId(0), PointId(1), Orientation::Forward, 0),
            Step::new(PathId(1), PointId(1), PointId(2), Orientation::Forward, 1),
        ];
        let route = Route::new(steps, 10);
        assert_eq!(route.source_point(), Some(PointId(0)));
        assert_eq!(route.final_destination(), Some(PointId(2)));
        assert_eq!(route.points(), vec![PointId(0), PointId(1), PointId(2)]);
        assert_eq!(route.with_costs(3).costs, 3);
        assert!(Route::empty().points().is_empty());
    }
}
