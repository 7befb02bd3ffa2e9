use super::*;
use crate::test_support::{courier, order, ScriptedBackend};
use shared::{domain::OrderStatus, protocol::AssignmentResponse};

fn setup() -> (Arc<ScriptedBackend>, OrderDispatcher, LiveOperationsStore) {
    let backend = Arc::new(ScriptedBackend::default());
    let dispatcher = OrderDispatcher::new(backend.clone(), GridBounds::new(10, 10));
    let store = LiveOperationsStore::new(backend.clone());
    (backend, dispatcher, store)
}

#[tokio::test]
async fn creates_then_assigns_then_refreshes() {
    let (backend, dispatcher, store) = setup();
    *backend.created_order.lock().expect("lock") = Ok(order("o1", 4, 4, OrderStatus::New));
    let mut assigned = order("o1", 4, 4, OrderStatus::Assigned);
    assigned.assigned_courier_id = Some("c1".into());
    *backend.assignment.lock().expect("lock") = Ok(AssignmentResponse {
        order: assigned.clone(),
        courier: courier("c1", 0.0, 0.0),
    });
    backend.set_orders(Ok(vec![assigned]));

    let result = dispatcher
        .create_and_assign(&RestaurantId::from("r1"), 4, 4, &store)
        .await
        .expect("assignment");

    assert_eq!(result.courier.id.as_str(), "c1");
    assert_eq!(
        backend.calls()[..2],
        ["create_order".to_string(), "assign_order".to_string()]
    );
    assert_eq!(store.snapshot().await.orders[0].status, OrderStatus::Assigned);

    let sent = backend.create_requests.lock().expect("lock")[0].clone();
    assert_eq!(sent, OrderDispatcher::build_request(&"r1".into(), 4, 4));
    assert_eq!(sent.label, "Order (4, 4)");
}

#[tokio::test]
async fn creation_failure_never_attempts_assignment() {
    let (backend, dispatcher, store) = setup();
    *backend.created_order.lock().expect("lock") = Err(DashboardError::Http {
        status: 400,
        body: "Unknown restaurant r9".to_string(),
    });

    let err = dispatcher
        .create_and_assign(&RestaurantId::from("r9"), 1, 1, &store)
        .await
        .expect_err("must fail");

    assert_eq!(err, DashboardError::Validation("Unknown restaurant r9".to_string()));
    assert_eq!(backend.call_count("assign_order"), 0);
    assert_eq!(backend.call_count("list_orders"), 0);
}

#[tokio::test]
async fn assignment_conflict_keeps_new_order_without_courier() {
    let (backend, dispatcher, store) = setup();
    *backend.created_order.lock().expect("lock") = Ok(order("o1", 4, 4, OrderStatus::New));
    *backend.assignment.lock().expect("lock") = Err(DashboardError::Http {
        status: 409,
        body: "No available courier".to_string(),
    });
    backend.set_orders(Ok(vec![order("o1", 4, 4, OrderStatus::New)]));

    let err = dispatcher
        .create_and_assign(&RestaurantId::from("r1"), 4, 4, &store)
        .await
        .expect_err("must fail");

    assert_eq!(
        err,
        DashboardError::Assignment {
            order_id: "o1".to_string(),
            detail: "No available courier".to_string(),
        }
    );
    assert_eq!(backend.call_count("assign_order"), 1);
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.orders[0].status, OrderStatus::New);
    assert_eq!(snapshot.orders[0].assigned_courier_id, None);
}

#[tokio::test]
async fn out_of_bounds_location_never_reaches_backend() {
    let (backend, dispatcher, store) = setup();

    for (x, y) in [(-1, 4), (4, 10), (10, 0)] {
        let err = dispatcher
            .create_and_assign(&RestaurantId::from("r1"), x, y, &store)
            .await
            .expect_err("must fail");
        assert!(matches!(err, DashboardError::Validation(_)));
    }
    assert!(backend.calls().is_empty());
}
