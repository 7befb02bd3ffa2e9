//! In-memory backend used by the unit tests.

use std::{
    collections::VecDeque,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{
        Cell, Courier, CourierId, Order, OrderId, OrderStatus, Restaurant, RestaurantId,
        RoutePoint, RouteResult,
    },
    error::DashboardError,
    protocol::{AssignmentResponse, CreateOrderRequest, MultiRouteRequest, PointRouteRequest},
};
use tokio::sync::oneshot;

use crate::backend::DispatchBackend;

pub(crate) struct RouteReply {
    release: Option<oneshot::Receiver<()>>,
    result: Result<RouteResult, DashboardError>,
}

impl RouteReply {
    pub(crate) fn immediate(result: Result<RouteResult, DashboardError>) -> Self {
        Self {
            release: None,
            result,
        }
    }

    /// Reply that is held back until the returned sender fires.
    pub(crate) fn gated(result: Result<RouteResult, DashboardError>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                release: Some(rx),
                result,
            },
            tx,
        )
    }
}

type HeldOrders = (oneshot::Receiver<()>, Result<Vec<Order>, DashboardError>);

pub(crate) struct ScriptedBackend {
    pub(crate) restaurants: Mutex<Result<Vec<Restaurant>, DashboardError>>,
    pub(crate) layout: Mutex<Result<Vec<Cell>, DashboardError>>,
    pub(crate) orders: Mutex<Result<Vec<Order>, DashboardError>>,
    held_orders: Mutex<VecDeque<HeldOrders>>,
    pub(crate) couriers: Mutex<Result<Vec<Courier>, DashboardError>>,
    pub(crate) created_order: Mutex<Result<Order, DashboardError>>,
    pub(crate) assignment: Mutex<Result<AssignmentResponse, DashboardError>>,
    pub(crate) step: Mutex<Result<(), DashboardError>>,
    pub(crate) route_replies: Mutex<VecDeque<RouteReply>>,
    pub(crate) multi_requests: Mutex<Vec<MultiRouteRequest>>,
    pub(crate) point_requests: Mutex<Vec<PointRouteRequest>>,
    pub(crate) create_requests: Mutex<Vec<CreateOrderRequest>>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            restaurants: Mutex::new(Ok(vec![restaurant("r1", 2, 3), restaurant("r2", 7, 7)])),
            layout: Mutex::new(Ok(Vec::new())),
            orders: Mutex::new(Ok(Vec::new())),
            held_orders: Mutex::new(VecDeque::new()),
            couriers: Mutex::new(Ok(Vec::new())),
            created_order: Mutex::new(Err(DashboardError::Network("not scripted".into()))),
            assignment: Mutex::new(Err(DashboardError::Network("not scripted".into()))),
            step: Mutex::new(Ok(())),
            route_replies: Mutex::new(VecDeque::new()),
            multi_requests: Mutex::new(Vec::new()),
            point_requests: Mutex::new(Vec::new()),
            create_requests: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedBackend {
    pub(crate) fn push_route(&self, reply: RouteReply) {
        self.route_replies.lock().expect("lock").push_back(reply);
    }

    pub(crate) fn set_orders(&self, orders: Result<Vec<Order>, DashboardError>) {
        *self.orders.lock().expect("lock") = orders;
    }

    /// The next `list_orders` call answers with `orders`, but only once the
    /// returned sender fires. Later calls fall back to the scripted orders.
    pub(crate) fn hold_next_orders(
        &self,
        orders: Result<Vec<Order>, DashboardError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held_orders
            .lock()
            .expect("lock")
            .push_back((rx, orders));
        tx
    }

    pub(crate) fn set_couriers(&self, couriers: Result<Vec<Courier>, DashboardError>) {
        *self.couriers.lock().expect("lock") = couriers;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    pub(crate) fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|call| call.as_str() == name)
            .count()
    }

    pub(crate) async fn wait_for_calls(&self, name: &str, count: usize) {
        for _ in 0..400 {
            if self.call_count(name) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {count} {name} calls");
    }

    fn record(&self, name: &str) {
        self.calls.lock().expect("lock").push(name.to_string());
    }

    async fn next_route(&self) -> Result<RouteResult, DashboardError> {
        let reply = self
            .route_replies
            .lock()
            .expect("lock")
            .pop_front()
            .expect("unscripted route call");
        if let Some(release) = reply.release {
            let _ = release.await;
        }
        reply.result
    }
}

#[async_trait]
impl DispatchBackend for ScriptedBackend {
    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, DashboardError> {
        self.record("list_restaurants");
        self.restaurants.lock().expect("lock").clone()
    }

    async fn city_layout(&self) -> Result<Vec<Cell>, DashboardError> {
        self.record("city_layout");
        self.layout.lock().expect("lock").clone()
    }

    async fn point_route(
        &self,
        request: &PointRouteRequest,
    ) -> Result<RouteResult, DashboardError> {
        self.record("point_route");
        self.point_requests
            .lock()
            .expect("lock")
            .push(request.clone());
        self.next_route().await
    }

    async fn multi_route(
        &self,
        request: &MultiRouteRequest,
    ) -> Result<RouteResult, DashboardError> {
        self.record("multi_route");
        self.multi_requests
            .lock()
            .expect("lock")
            .push(request.clone());
        self.next_route().await
    }

    async fn list_couriers(&self) -> Result<Vec<Courier>, DashboardError> {
        self.record("list_couriers");
        self.couriers.lock().expect("lock").clone()
    }

    async fn list_orders(&self) -> Result<Vec<Order>, DashboardError> {
        self.record("list_orders");
        let held = self.held_orders.lock().expect("lock").pop_front();
        if let Some((release, orders)) = held {
            let _ = release.await;
            return orders;
        }
        self.orders.lock().expect("lock").clone()
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, DashboardError> {
        self.record("create_order");
        self.create_requests
            .lock()
            .expect("lock")
            .push(request.clone());
        self.created_order.lock().expect("lock").clone()
    }

    async fn assign_order(
        &self,
        _order_id: &OrderId,
    ) -> Result<AssignmentResponse, DashboardError> {
        self.record("assign_order");
        self.assignment.lock().expect("lock").clone()
    }

    async fn step_simulation(&self) -> Result<(), DashboardError> {
        self.record("step_simulation");
        self.step.lock().expect("lock").clone()
    }
}

pub(crate) fn restaurant(id: &str, x: i32, y: i32) -> Restaurant {
    Restaurant {
        id: RestaurantId::from(id),
        name: format!("Restaurant {id}"),
        x,
        y,
    }
}

pub(crate) fn order(id: &str, x: i32, y: i32, status: OrderStatus) -> Order {
    Order {
        id: OrderId::from(id),
        restaurant_id: RestaurantId::from("r1"),
        x,
        y,
        label: format!("Order ({x}, {y})"),
        status,
        assigned_courier_id: None,
    }
}

pub(crate) fn courier(id: &str, x: f64, y: f64) -> Courier {
    Courier {
        id: CourierId::from(id),
        name: format!("Courier {id}"),
        current_x: x,
        current_y: y,
    }
}

pub(crate) fn route(points: &[(i32, i32)]) -> RouteResult {
    RouteResult {
        path: points.iter().map(|&(x, y)| RoutePoint { x, y }).collect(),
        total_distance: points.len().saturating_sub(1) as f64,
        visited_nodes: points.len() as u64 * 3,
        time_ms: 1.5,
    }
}
