use super::*;
use crate::test_support::{courier, order, ScriptedBackend};
use shared::domain::OrderStatus;

fn store(backend: &Arc<ScriptedBackend>) -> LiveOperationsStore {
    LiveOperationsStore::new(backend.clone())
}

#[tokio::test]
async fn refresh_replaces_orders_and_couriers_together() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_orders(Ok(vec![order("o1", 1, 1, OrderStatus::New)]));
    backend.set_couriers(Ok(vec![courier("c1", 0.5, 0.0)]));
    let store = store(&backend);

    store.refresh().await.expect("refresh");

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.orders.len(), 1);
    assert_eq!(snapshot.couriers[0].current_x, 0.5);
    assert_eq!(backend.call_count("list_orders"), 1);
    assert_eq!(backend.call_count("list_couriers"), 1);
}

#[tokio::test]
async fn courier_failure_leaves_previous_snapshot_untouched() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_orders(Ok(vec![order("o1", 1, 1, OrderStatus::New)]));
    backend.set_couriers(Ok(vec![courier("c1", 1.0, 1.0)]));
    let store = store(&backend);
    store.refresh().await.expect("first refresh");
    let before = store.snapshot().await;

    backend.set_orders(Ok(vec![
        order("o1", 1, 1, OrderStatus::Assigned),
        order("o2", 3, 3, OrderStatus::New),
    ]));
    backend.set_couriers(Err(DashboardError::Http {
        status: 500,
        body: "courier service down".to_string(),
    }));

    let err = store.refresh().await.expect_err("must fail");
    assert_eq!(err.user_message(), "courier service down");
    assert_eq!(*store.snapshot().await, *before);
}

#[tokio::test]
async fn order_failure_leaves_previous_snapshot_untouched() {
    let backend = Arc::new(ScriptedBackend::default());
    let store = store(&backend);
    backend.set_couriers(Ok(vec![courier("c1", 1.0, 1.0)]));
    backend.set_orders(Err(DashboardError::Network("connection reset".to_string())));

    assert!(store.refresh().await.is_err());
    assert_eq!(*store.snapshot().await, LiveSnapshot::default());
}

#[tokio::test]
async fn slow_older_refresh_never_replaces_a_newer_snapshot() {
    let backend = Arc::new(ScriptedBackend::default());
    let release_older = backend.hold_next_orders(Ok(vec![order("o1", 1, 1, OrderStatus::New)]));
    backend.set_orders(Ok(vec![order("o1", 1, 1, OrderStatus::Delivered)]));
    backend.set_couriers(Ok(vec![courier("c1", 2.0, 2.0)]));
    let store = Arc::new(store(&backend));

    let older = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    backend.wait_for_calls("list_orders", 1).await;

    store.refresh().await.expect("newer refresh");
    release_older.send(()).expect("release");
    let older = older.await.expect("join");

    assert!(matches!(
        older,
        Err(DashboardError::StaleResultDiscarded { sequence: 1 })
    ));
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.orders[0].status, OrderStatus::Delivered);
    assert_eq!(snapshot.delivered_orders().len(), 1);
}

#[tokio::test]
async fn derived_views_split_orders_by_status() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_orders(Ok(vec![
        order("o1", 1, 1, OrderStatus::New),
        order("o2", 2, 2, OrderStatus::Delivered),
        order("o3", 3, 3, OrderStatus::Assigned),
        order("o4", 4, 4, OrderStatus::InProgress),
    ]));
    let store = store(&backend);
    store.refresh().await.expect("refresh");

    let active: Vec<String> = store
        .active_orders()
        .await
        .into_iter()
        .map(|o| o.id.0)
        .collect();
    let delivered: Vec<String> = store
        .delivered_orders()
        .await
        .into_iter()
        .map(|o| o.id.0)
        .collect();

    assert_eq!(active, vec!["o1", "o3", "o4"]);
    assert_eq!(delivered, vec!["o2"]);
}

#[tokio::test]
async fn restaurants_load_once_and_failures_keep_empty_list() {
    let backend = Arc::new(ScriptedBackend::default());
    let store = store(&backend);
    assert_eq!(store.load_restaurants().await.expect("load"), 2);
    assert_eq!(store.restaurants().await.len(), 2);

    let failing = Arc::new(ScriptedBackend::default());
    *failing.restaurants.lock().expect("lock") =
        Err(DashboardError::Decode("expected array".to_string()));
    let store = LiveOperationsStore::new(failing.clone());
    assert!(store.load_restaurants().await.is_err());
    assert!(store.restaurants().await.is_empty());
}
