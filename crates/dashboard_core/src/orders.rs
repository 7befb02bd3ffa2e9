//! Order creation from a live-view click, followed by courier assignment.

use std::sync::Arc;

use shared::{
    domain::{Courier, GridBounds, Order, RestaurantId},
    error::DashboardError,
    protocol::CreateOrderRequest,
};
use tracing::{info, warn};

use crate::{backend::DispatchBackend, live::LiveOperationsStore};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAssignment {
    pub order: Order,
    pub courier: Courier,
}

pub struct OrderDispatcher {
    backend: Arc<dyn DispatchBackend>,
    bounds: GridBounds,
}

impl OrderDispatcher {
    pub fn new(backend: Arc<dyn DispatchBackend>, bounds: GridBounds) -> Self {
        Self { backend, bounds }
    }

    pub fn build_request(restaurant_id: &RestaurantId, x: i32, y: i32) -> CreateOrderRequest {
        CreateOrderRequest {
            restaurant_id: restaurant_id.clone(),
            x,
            y,
            label: format!("Order ({x}, {y})"),
        }
    }

    /// Creates the order, then asks for a courier. Assignment is only attempted
    /// once creation succeeded; neither step is retried. Whenever an order was
    /// created the store is refreshed so it shows up without waiting for a tick.
    pub async fn create_and_assign(
        &self,
        restaurant_id: &RestaurantId,
        x: i64,
        y: i64,
        store: &LiveOperationsStore,
    ) -> Result<OrderAssignment, DashboardError> {
        if !self.bounds.contains(x, y) {
            return Err(DashboardError::validation(format!(
                "order location ({x}, {y}) is outside the grid"
            )));
        }

        let request = Self::build_request(restaurant_id, x as i32, y as i32);
        let order = self
            .backend
            .create_order(&request)
            .await
            .map_err(creation_error)?;
        info!(
            order_id = %order.id,
            restaurant_id = %restaurant_id,
            x,
            y,
            "orders: created"
        );

        let assigned = self.backend.assign_order(&order.id).await;
        refresh_after_change(store).await;

        match assigned {
            Ok(response) => {
                info!(
                    order_id = %response.order.id,
                    courier_id = %response.courier.id,
                    "orders: courier assigned"
                );
                Ok(OrderAssignment {
                    order: response.order,
                    courier: response.courier,
                })
            }
            Err(err) => {
                warn!(order_id = %order.id, "orders: assignment failed: {err}");
                Err(DashboardError::Assignment {
                    order_id: order.id.0,
                    detail: err.user_message(),
                })
            }
        }
    }
}

/// Client errors on creation are the backend rejecting our input.
fn creation_error(err: DashboardError) -> DashboardError {
    match err {
        DashboardError::Http { status, body } if (400..500).contains(&status) => {
            DashboardError::Validation(body)
        }
        other => other,
    }
}

async fn refresh_after_change(store: &LiveOperationsStore) {
    if let Err(err) = store.refresh().await {
        if !err.is_stale() {
            warn!("orders: refresh after order change failed: {err}");
        }
    }
}

#[cfg(test)]
#[path = "tests/orders_tests.rs"]
mod tests;
