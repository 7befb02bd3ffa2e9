//! Wires input events and poll ticks to the dashboard components and keeps both
//! surfaces redrawn.
//!
//! The orchestrator is the single owner of the planner session and the live
//! store. View state sits behind a plain mutex that is never held across an
//! await, so every network result lands as one uninterrupted update and a
//! redraw always reads a fully-applied state.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use shared::{
    domain::{GridBounds, Restaurant, RoutePoint},
    error::DashboardError,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    backend::DispatchBackend,
    live::{LiveOperationsStore, LiveSnapshot},
    orders::OrderDispatcher,
    planner::{CoordinateFields, PlannerSession, PlannerState},
    poller::TickHandler,
    presenter::{ErrorArea, Presenter, RouteMetrics},
    render::{compose_overlays, SurfaceId},
    route::{RouteCompletion, RouteDispatcher},
    sequence::Sequence,
    terrain::GridTerrainCache,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    pub bounds: GridBounds,
    pub default_heuristic: String,
    pub default_strategy: String,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            bounds: GridBounds::new(20, 20),
            default_heuristic: "MANHATTAN".to_string(),
            default_strategy: "IN_ORDER".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    SelectRestaurant(String),
    PlannerClick { x: i64, y: i64 },
    SetManualStart { x: String, y: String },
    SetManualEnd { x: String, y: String },
    ResetPlanner,
    ComputeRoute {
        heuristic: Option<String>,
        strategy: Option<String>,
    },
    ComputePointRoute { heuristic: Option<String> },
    SelectLiveRestaurant(String),
    LiveClick { x: i64, y: i64 },
    Redraw,
}

struct ViewState {
    planner: PlannerSession,
    manual_start: CoordinateFields,
    manual_end: CoordinateFields,
    live_restaurant: Option<Restaurant>,
}

pub struct Orchestrator {
    backend: Arc<dyn DispatchBackend>,
    presenter: Arc<dyn Presenter>,
    options: DashboardOptions,
    terrain: RwLock<Arc<GridTerrainCache>>,
    view: Mutex<ViewState>,
    store: LiveOperationsStore,
    routes: RouteDispatcher,
    orders: OrderDispatcher,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn DispatchBackend>,
        presenter: Arc<dyn Presenter>,
        options: DashboardOptions,
    ) -> Arc<Self> {
        let bounds = options.bounds;
        Arc::new(Self {
            store: LiveOperationsStore::new(Arc::clone(&backend)),
            routes: RouteDispatcher::new(Arc::clone(&backend), bounds),
            orders: OrderDispatcher::new(Arc::clone(&backend), bounds),
            terrain: RwLock::new(Arc::new(GridTerrainCache::empty(bounds))),
            view: Mutex::new(ViewState {
                planner: PlannerSession::new(bounds),
                manual_start: CoordinateFields::default(),
                manual_end: CoordinateFields::default(),
                live_restaurant: None,
            }),
            backend,
            presenter,
            options,
        })
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    /// Loads terrain and restaurants, takes a first live snapshot and paints
    /// everything. Failures degrade to defaults and never abort startup.
    pub async fn initialize(&self) {
        match GridTerrainCache::load(self.backend.as_ref(), self.options.bounds).await {
            Ok(terrain) => {
                info!(obstacles = terrain.obstacles().len(), "orchestrator: terrain loaded");
                *self.terrain.write().await = Arc::new(terrain);
            }
            Err(err) => warn!("orchestrator: terrain load failed, using all-road grid: {err}"),
        }

        self.refresh_live().await;
        match self.store.load_restaurants().await {
            Ok(count) => info!(count, "orchestrator: restaurants loaded"),
            Err(err) => {
                warn!("orchestrator: restaurant load failed: {err}");
                self.presenter.set_error_text(
                    ErrorArea::LiveStatus,
                    &format!("Live data unavailable: {}", err.user_message()),
                );
            }
        }
        self.redraw_all().await;
    }

    pub async fn handle(&self, event: DashboardEvent) {
        debug!(?event, "orchestrator: handling event");
        match event {
            DashboardEvent::SelectRestaurant(id) => self.select_restaurant(&id).await,
            DashboardEvent::PlannerClick { x, y } => self.add_stop(x, y).await,
            DashboardEvent::SetManualStart { x, y } => {
                self.lock_view().manual_start = CoordinateFields::new(x, y);
            }
            DashboardEvent::SetManualEnd { x, y } => {
                self.lock_view().manual_end = CoordinateFields::new(x, y);
            }
            DashboardEvent::ResetPlanner => self.reset_planner().await,
            DashboardEvent::ComputeRoute {
                heuristic,
                strategy,
            } => self.compute_route(heuristic, strategy).await,
            DashboardEvent::ComputePointRoute { heuristic } => {
                self.compute_point_route(heuristic).await
            }
            DashboardEvent::SelectLiveRestaurant(id) => self.select_live_restaurant(&id).await,
            DashboardEvent::LiveClick { x, y } => self.create_order(x, y).await,
            DashboardEvent::Redraw => self.redraw_all().await,
        }
    }

    /// One poll tick: advance the simulation, refresh, redraw. A failed step is
    /// logged and the refresh still runs.
    pub async fn run_tick(&self) {
        if let Err(err) = self.backend.step_simulation().await {
            warn!("orchestrator: simulation step failed: {err}");
        }
        self.refresh_live().await;
        self.redraw_all().await;
    }

    pub fn planner(&self) -> PlannerSession {
        self.lock_view().planner.clone()
    }

    pub fn live_restaurant(&self) -> Option<Restaurant> {
        self.lock_view().live_restaurant.clone()
    }

    pub async fn live_snapshot(&self) -> Arc<LiveSnapshot> {
        self.store.snapshot().await
    }

    pub async fn terrain(&self) -> Arc<GridTerrainCache> {
        self.terrain.read().await.clone()
    }

    pub async fn redraw_all(&self) {
        self.redraw_planner().await;
        self.redraw_live().await;
    }

    pub async fn redraw_planner(&self) {
        let terrain = self.terrain().await;
        let restaurants = self.store.restaurants().await;
        let snapshot = self.store.snapshot().await;
        let (stops, path) = {
            let view = self.lock_view();
            (view.planner.stops().to_vec(), view.planner.path().to_vec())
        };
        let overlays =
            compose_overlays(&restaurants, &snapshot.orders, &snapshot.couriers, &stops)
                .into_ordered();
        self.presenter.render(
            SurfaceId::Planner,
            &terrain,
            &overlays,
            polyline(&path),
        );
    }

    /// Repaints the live surface and both order panels from one snapshot.
    pub async fn redraw_live(&self) {
        let terrain = self.terrain().await;
        let restaurants = self.store.restaurants().await;
        let snapshot = self.store.snapshot().await;
        let overlays =
            compose_overlays(&restaurants, &snapshot.orders, &snapshot.couriers, &[])
                .into_ordered();
        self.presenter
            .render(SurfaceId::Live, &terrain, &overlays, None);
        self.presenter
            .render_order_panels(&snapshot.active_orders(), &snapshot.delivered_orders());
    }

    async fn select_restaurant(&self, id: &str) {
        let restaurants = self.store.restaurants().await;
        let state = {
            let mut view = self.lock_view();
            self.routes.invalidate();
            view.planner.select_restaurant(id, &restaurants)
        };
        if state == PlannerState::NoRestaurant {
            debug!(id, "orchestrator: no restaurant selected");
        }
        self.presenter.set_error_text(ErrorArea::Planner, "");
        self.presenter.set_metrics(None);
        self.redraw_planner().await;
    }

    async fn add_stop(&self, x: i64, y: i64) {
        let added = self.lock_view().planner.add_stop(x, y).cloned();
        match added {
            Some(stop) => {
                debug!(x, y, label = %stop.label, "orchestrator: stop added");
                self.redraw_planner().await;
            }
            None => debug!(x, y, "orchestrator: click outside grid ignored"),
        }
    }

    async fn reset_planner(&self) {
        {
            let mut view = self.lock_view();
            self.routes.invalidate();
            view.planner.reset();
        }
        self.presenter.set_error_text(ErrorArea::Planner, "");
        self.presenter.set_metrics(None);
        self.redraw_planner().await;
    }

    async fn compute_route(&self, heuristic: Option<String>, strategy: Option<String>) {
        let heuristic = heuristic.unwrap_or_else(|| self.options.default_heuristic.clone());
        let strategy = strategy.unwrap_or_else(|| self.options.default_strategy.clone());
        let prepared = {
            let view = self.lock_view();
            view.planner
                .prepare_route(&heuristic, &strategy, &view.manual_end)
                .map(|request| (self.routes.issue(), request))
        };
        let (sequence, request) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.presenter
                    .set_error_text(ErrorArea::Planner, &err.user_message());
                return;
            }
        };

        let outcome = self.routes.submit_request(sequence, &request).await;
        self.finish_route(sequence, outcome).await;
    }

    async fn compute_point_route(&self, heuristic: Option<String>) {
        let heuristic = heuristic.unwrap_or_else(|| self.options.default_heuristic.clone());
        let terrain = self.terrain().await;
        let prepared = {
            let view = self.lock_view();
            view.planner
                .prepare_point_route(&heuristic, &view.manual_start, &view.manual_end, &terrain)
                .map(|request| (self.routes.issue(), request))
        };
        let (sequence, request) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.presenter
                    .set_error_text(ErrorArea::Planner, &err.user_message());
                return;
            }
        };

        let outcome = self.routes.submit_point(sequence, &request).await;
        self.finish_route(sequence, outcome).await;
    }

    async fn finish_route(
        &self,
        sequence: Sequence,
        outcome: Result<RouteCompletion, DashboardError>,
    ) {
        let applied = match outcome {
            Ok(completion) => {
                let points = completion.result.path.len();
                let metrics = RouteMetrics::from_route(&completion.result);
                let mut view = self.lock_view();
                self.routes
                    .apply(&mut view.planner, completion)
                    .map(|()| (points, metrics))
            }
            Err(err) => Err(err),
        };

        match applied {
            Ok((points, metrics)) => {
                info!(
                    points,
                    total_distance = metrics.total_distance,
                    "orchestrator: route applied"
                );
                self.presenter.set_error_text(ErrorArea::Planner, "");
                self.presenter.set_metrics(Some(&metrics));
            }
            Err(err) if err.is_stale() => return,
            Err(err) => {
                let cleared = self
                    .routes
                    .apply_failure(&mut self.lock_view().planner, sequence);
                if cleared.is_err() {
                    return;
                }
                warn!("orchestrator: route request failed: {err}");
                self.presenter
                    .set_error_text(ErrorArea::Planner, &route_error_text(&err));
                self.presenter.set_metrics(None);
            }
        }
        self.redraw_planner().await;
    }

    async fn select_live_restaurant(&self, id: &str) {
        let restaurants = self.store.restaurants().await;
        let id = id.trim();
        let selected = restaurants
            .iter()
            .find(|restaurant| restaurant.id.as_str() == id)
            .cloned();
        if selected.is_none() {
            debug!(id, "orchestrator: live restaurant cleared");
        }
        self.lock_view().live_restaurant = selected;
        self.presenter.set_error_text(ErrorArea::Live, "");
    }

    async fn create_order(&self, x: i64, y: i64) {
        if !self.options.bounds.contains(x, y) {
            debug!(x, y, "orchestrator: order click outside grid ignored");
            return;
        }
        let Some(restaurant) = self.live_restaurant() else {
            self.presenter
                .set_error_text(ErrorArea::Live, "Please select a restaurant first");
            return;
        };

        match self
            .orders
            .create_and_assign(&restaurant.id, x, y, &self.store)
            .await
        {
            Ok(assignment) => {
                debug!(
                    order_id = %assignment.order.id,
                    courier_id = %assignment.courier.id,
                    "orchestrator: order dispatched"
                );
                self.presenter.set_error_text(ErrorArea::Live, "");
            }
            Err(err) => {
                self.presenter
                    .set_error_text(ErrorArea::Live, &order_error_text(&err));
            }
        }
        self.redraw_all().await;
    }

    async fn refresh_live(&self) {
        match self.store.refresh().await {
            Ok(()) => self.presenter.set_error_text(ErrorArea::LiveStatus, ""),
            Err(err) if err.is_stale() => {}
            Err(err) => self.presenter.set_error_text(
                ErrorArea::LiveStatus,
                &format!("Live data unavailable: {}", err.user_message()),
            ),
        }
    }

    fn lock_view(&self) -> MutexGuard<'_, ViewState> {
        self.view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TickHandler for Orchestrator {
    async fn tick(&self) {
        self.run_tick().await;
    }
}

fn polyline(path: &[RoutePoint]) -> Option<&[RoutePoint]> {
    (!path.is_empty()).then_some(path)
}

fn route_error_text(err: &DashboardError) -> String {
    match err {
        DashboardError::Http { status, body } => format!("Error: {status} {body}"),
        DashboardError::Network(detail) => format!("Network error: {detail}"),
        DashboardError::Validation(detail) => detail.clone(),
        other => format!("Error: {}", other.user_message()),
    }
}

fn order_error_text(err: &DashboardError) -> String {
    match err {
        DashboardError::Assignment { detail, .. } => {
            format!("Error assigning courier: {detail}")
        }
        other => format!("Error creating order: {}", other.user_message()),
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
