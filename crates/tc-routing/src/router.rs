//! `Router` — per-routing-group point routers over the live plant store.
//!
//! # Caching
//!
//! The router keeps one [`PointRouter`] per routing group, tagged with the
//! [`PlantStore`] generation it was built from.  A query first compares that
//! tag with the store's current generation; on mismatch the group's graph is
//! rebuilt from a fresh snapshot and the cached `Arc` is replaced.  Queries
//! already running keep their `Arc` to the old router and finish against the
//! stale graph.
//!
//! The first vehicle to ask for a group determines the profile handed to the
//! evaluator for that group's build.  Evaluators that depend on per-vehicle
//! properties should therefore be uniform within a group.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use tc_core::{PointId, RouterConfig, VehicleId, VehicleProfile};
use tc_plant::{PlantModel, PlantStore};

use crate::graph::RoutingGraph;
use crate::point_router::PointRouter;
use crate::{EdgeEvaluator, EvaluatorComposite, Route, RoutingError, RoutingResult};

struct CachedPointRouter {
    generation: u64,
    router:     Arc<PointRouter>,
}

pub struct Router {
    plant:     Arc<PlantStore>,
    config:    RouterConfig,
    evaluator: Arc<dyn EdgeEvaluator>,

    point_routers: RwLock<FxHashMap<String, CachedPointRouter>>,
    /// Routes most recently selected per vehicle, one per drive order.
    selected:      RwLock<FxHashMap<VehicleId, Vec<Route>>>,
}

impl Router {
    /// A router whose edge weights come from `config.evaluators`.
    pub fn new(plant: Arc<PlantStore>, config: RouterConfig) -> Self {
        let evaluator = Arc::new(EvaluatorComposite::from_config(&config.evaluators));
        Self::with_evaluator(plant, config, evaluator)
    }

    /// A router with a caller-supplied evaluator; `config.evaluators` is ignored.
    pub fn with_evaluator(
        plant: Arc<PlantStore>,
        config: RouterConfig,
        evaluator: Arc<dyn EdgeEvaluator>,
    ) -> Self {
        Self {
            plant,
            config,
            evaluator,
            point_routers: RwLock::new(FxHashMap::default()),
            selected: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn plant(&self) -> &Arc<PlantStore> {
        &self.plant
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    // ── Point-router cache ────────────────────────────────────────────────

    /// The up-to-date point router for `vehicle`'s routing group.
    pub fn point_router(&self, vehicle: &VehicleProfile) -> Arc<PointRouter> {
        let group = vehicle.routing_group_or(&self.config.default_routing_group);
        let (generation, model) = self.plant.versioned_snapshot();

        if let Some(cached) = self.point_routers.read().get(group) {
            if cached.generation == generation {
                return Arc::clone(&cached.router);
            }
        }

        // Build outside the lock; a concurrent builder may win the race, in
        // which case the newer of the two is kept.
        let built = Arc::new(self.build_point_router(&model, group, vehicle, &FxHashSet::default()));
        let mut cache = self.point_routers.write();
        let newer = cache
            .get(group)
            .filter(|cached| cached.generation >= generation)
            .map(|cached| Arc::clone(&cached.router));
        if let Some(router) = newer {
            return router;
        }
        tracing::info!(
            group,
            generation,
            edges = built.graph().edge_count(),
            "created point router"
        );
        cache.insert(
            group.to_owned(),
            CachedPointRouter { generation, router: Arc::clone(&built) },
        );
        built
    }

    /// Drop every cached point router.  They are rebuilt on next use.
    pub fn invalidate(&self) {
        self.point_routers.write().clear();
        tracing::debug!("point router cache cleared");
    }

    /// Number of cached point routers (one per routing group seen so far).
    pub fn point_router_count(&self) -> usize {
        self.point_routers.read().len()
    }

    fn build_point_router(
        &self,
        model: &PlantModel,
        group: &str,
        vehicle: &VehicleProfile,
        excluded: &FxHashSet<PointId>,
    ) -> PointRouter {
        let graph = RoutingGraph::build(model, group, vehicle, self.evaluator.as_ref(), excluded);
        PointRouter::new(graph, self.config.algorithm)
    }

    fn checked(router: &PointRouter, points: &[PointId]) -> RoutingResult<()> {
        match points.iter().find(|p| !router.graph().contains(**p)) {
            Some(&p) => Err(RoutingError::UnknownPoint(p)),
            None => Ok(()),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// The cheapest route for `vehicle` from `source` to `destination`, or
    /// `None` if the destination is unreachable in the vehicle's group.
    pub fn compute_route(
        &self,
        vehicle: &VehicleProfile,
        source: PointId,
        destination: PointId,
    ) -> RoutingResult<Option<Route>> {
        let router = self.point_router(vehicle);
        Self::checked(&router, &[source, destination])?;
        Ok(router.route(source, destination))
    }

    /// Routes to several destinations from one shortest-path tree.
    /// Unreachable destinations are absent from the map.
    pub fn compute_routes(
        &self,
        vehicle: &VehicleProfile,
        source: PointId,
        destinations: &[PointId],
    ) -> RoutingResult<BTreeMap<PointId, Route>> {
        let router = self.point_router(vehicle);
        Self::checked(&router, &[source])?;
        Self::checked(&router, destinations)?;
        Ok(router.routes_from(source, destinations))
    }

    /// Routing cost, or [`INFINITE_COSTS`](crate::INFINITE_COSTS) if unreachable.
    pub fn costs(
        &self,
        vehicle: &VehicleProfile,
        source: PointId,
        destination: PointId,
    ) -> RoutingResult<u64> {
        let router = self.point_router(vehicle);
        Self::checked(&router, &[source, destination])?;
        Ok(router.costs(source, destination))
    }

    /// One route per destination, each starting where the previous one ends.
    ///
    /// `None` if any leg is unreachable.
    pub fn route_drive_orders(
        &self,
        vehicle: &VehicleProfile,
        source: PointId,
        destinations: &[PointId],
    ) -> RoutingResult<Option<Vec<Route>>> {
        let router = self.point_router(vehicle);
        Self::checked(&router, &[source])?;
        Self::checked(&router, destinations)?;

        let mut routes = Vec::with_capacity(destinations.len());
        let mut from = source;
        for &to in destinations {
            match router.route(from, to) {
                Some(route) => routes.push(route),
                None => {
                    tracing::debug!(vehicle = %vehicle.id, %from, %to, "drive order leg unreachable");
                    return Ok(None);
                }
            }
            from = to;
        }
        Ok(Some(routes))
    }

    /// Like [`compute_route`](Self::compute_route), but on a one-off graph
    /// without `unusable` points and every path touching them.  The cache is
    /// neither read nor updated.
    pub fn compute_route_avoiding(
        &self,
        vehicle: &VehicleProfile,
        source: PointId,
        destination: PointId,
        unusable: &[PointId],
    ) -> RoutingResult<Option<Route>> {
        let model = self.plant.snapshot();
        let group = vehicle.routing_group_or(&self.config.default_routing_group);
        let excluded: FxHashSet<PointId> = unusable.iter().copied().collect();
        let router = self.build_point_router(&model, group, vehicle, &excluded);
        Self::checked(&router, &[source, destination])?;
        Ok(router.route(source, destination))
    }

    /// Routing cost from each candidate's position to `destination`, sorted
    /// cheapest first (ties by vehicle id).  Unreachable candidates are kept
    /// with [`INFINITE_COSTS`](crate::INFINITE_COSTS) and sort last.
    pub fn costs_from_many(
        &self,
        candidates: &[(VehicleProfile, PointId)],
        destination: PointId,
    ) -> RoutingResult<Vec<(VehicleId, u64)>> {
        let cost_of = |(vehicle, source): &(VehicleProfile, PointId)| {
            self.costs(vehicle, *source, destination).map(|c| (vehicle.id, c))
        };

        #[cfg(not(feature = "parallel"))]
        let mut ranked = candidates.iter().map(cost_of).collect::<RoutingResult<Vec<_>>>()?;

        #[cfg(feature = "parallel")]
        let mut ranked = {
            use rayon::prelude::*;
            candidates.par_iter().map(cost_of).collect::<RoutingResult<Vec<_>>>()?
        };

        ranked.sort_by_key(|&(id, cost)| (cost, id));
        Ok(ranked)
    }

    // ── Route bookkeeping ─────────────────────────────────────────────────

    /// Record the routes `vehicle` is now following.
    pub fn select_route(&self, vehicle: VehicleId, routes: Vec<Route>) {
        tracing::debug!(%vehicle, legs = routes.len(), "route selected");
        self.selected.write().insert(vehicle, routes);
    }

    /// Forget the selected routes of `vehicle`.
    pub fn clear_selected_route(&self, vehicle: VehicleId) {
        self.selected.write().remove(&vehicle);
    }

    pub fn selected_route(&self, vehicle: VehicleId) -> Option<Vec<Route>> {
        self.selected.read().get(&vehicle).cloned()
    }
}
