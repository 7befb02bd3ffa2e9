//! Latest polled snapshot of the live-operations view.

use std::sync::Arc;

use futures::future::join;
use shared::{
    domain::{Courier, Order, Restaurant},
    error::DashboardError,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{backend::DispatchBackend, sequence::SequenceGate};

/// Orders and couriers fetched together. Only ever replaced as a pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveSnapshot {
    pub orders: Vec<Order>,
    pub couriers: Vec<Courier>,
}

impl LiveSnapshot {
    pub fn active_orders(&self) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| order.status.is_active())
            .cloned()
            .collect()
    }

    pub fn delivered_orders(&self) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| !order.status.is_active())
            .cloned()
            .collect()
    }
}

pub struct LiveOperationsStore {
    backend: Arc<dyn DispatchBackend>,
    restaurants: RwLock<Arc<Vec<Restaurant>>>,
    snapshot: RwLock<Arc<LiveSnapshot>>,
    refreshes: SequenceGate,
}

impl LiveOperationsStore {
    pub fn new(backend: Arc<dyn DispatchBackend>) -> Self {
        Self {
            backend,
            restaurants: RwLock::new(Arc::new(Vec::new())),
            snapshot: RwLock::new(Arc::new(LiveSnapshot::default())),
            refreshes: SequenceGate::new(),
        }
    }

    /// Restaurants are static for the session; a failed load keeps the empty list.
    pub async fn load_restaurants(&self) -> Result<usize, DashboardError> {
        let restaurants = self.backend.list_restaurants().await?;
        let count = restaurants.len();
        *self.restaurants.write().await = Arc::new(restaurants);
        Ok(count)
    }

    /// Fetches orders and couriers concurrently and swaps in the pair only if both
    /// succeeded and no newer refresh has been applied meanwhile.
    pub async fn refresh(&self) -> Result<(), DashboardError> {
        let sequence = self.refreshes.issue();
        let (orders, couriers) =
            join(self.backend.list_orders(), self.backend.list_couriers()).await;

        let snapshot = match (orders, couriers) {
            (Ok(orders), Ok(couriers)) => LiveSnapshot { orders, couriers },
            (Err(err), couriers) => {
                warn!(
                    sequence = sequence.value(),
                    couriers_ok = couriers.is_ok(),
                    "live: orders fetch failed, keeping previous snapshot: {err}"
                );
                return Err(err);
            }
            (Ok(_), Err(err)) => {
                warn!(
                    sequence = sequence.value(),
                    "live: couriers fetch failed, keeping previous snapshot: {err}"
                );
                return Err(err);
            }
        };

        let mut guard = self.snapshot.write().await;
        if !self.refreshes.try_advance(sequence) {
            debug!(
                sequence = sequence.value(),
                "live: newer snapshot already applied, dropping refresh"
            );
            return Err(DashboardError::StaleResultDiscarded {
                sequence: sequence.value(),
            });
        }
        *guard = Arc::new(snapshot);
        Ok(())
    }

    pub async fn snapshot(&self) -> Arc<LiveSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn restaurants(&self) -> Arc<Vec<Restaurant>> {
        self.restaurants.read().await.clone()
    }

    pub async fn active_orders(&self) -> Vec<Order> {
        self.snapshot().await.active_orders()
    }

    pub async fn delivered_orders(&self) -> Vec<Order> {
        self.snapshot().await.delivered_orders()
    }
}

#[cfg(test)]
#[path = "tests/live_tests.rs"]
mod tests;
