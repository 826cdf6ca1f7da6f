//! Integration tests for the query/mutation façade.
//!
//! Every test runs the service against a scripted `MockTransport` and checks
//! both the wire request that went out and the resulting store state.

use std::sync::Arc;

use order_sync::application::{
    FetchTarget, OrderInput, OrderModification, OrderService, OrderStore, Selection, StoreChange,
};
use order_sync::domain::{OrderId, OrderStatus, PayloadError, TenantId};
use order_sync::error::Error;
use order_sync::port::TransportError;
use order_sync::testkit::domain::{full_order_payload, order, order_payload};
use order_sync::testkit::transport::MockTransport;
use rust_decimal_macros::dec;
use serde_json::json;

fn service(transport: &Arc<MockTransport>) -> (OrderService, Arc<OrderStore>) {
    let store = Arc::new(OrderStore::new());
    (OrderService::new(transport.clone(), Arc::clone(&store)), store)
}

#[tokio::test]
async fn test_place_order_sets_current_only() {
    let transport = Arc::new(MockTransport::new().with_response(
        "PlaceOrder",
        json!({ "createOrder": order_payload("o1", "pending") }),
    ));
    let (service, _) = service(&transport);
    assert!(service.store().current().is_none());

    let placed = service
        .place_order(OrderInput::new(vec![json!({ "productId": "p1", "quantity": 2 })]))
        .await
        .unwrap();

    let current = service.store().current().unwrap();
    assert_eq!(placed, current);
    assert_eq!(current.id().as_str(), "o1");
    assert!(current.is_pending());
    assert_eq!(current.total_sum(), Some(dec!(18.40)));
    assert!(service.store().collection().is_empty());

    let sent = transport.requests_for("PlaceOrder");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].variables["order"]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_fetch_order_targets_collection_or_current() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response("OrderById", json!({ "order": full_order_payload("o1", "pending") }))
            .with_response("OrderById", json!({ "order": order_payload("o2", "delivering") })),
    );
    let (service, _) = service(&transport);

    service
        .fetch_order(&OrderId::new("o1"), Selection::Full, FetchTarget::Collection)
        .await
        .unwrap();
    service
        .fetch_order(&OrderId::new("o2"), Selection::Summary, FetchTarget::Current)
        .await
        .unwrap();

    let snapshot = service.store().snapshot();
    assert_eq!(snapshot.collection.len(), 1);
    assert_eq!(snapshot.collection[0].products()[0].id, "p1");
    assert!(snapshot.current.unwrap().is_delivering());

    let sent = transport.requests_for("OrderById");
    assert!(sent[0].query.contains("products { id name }"));
    assert!(!sent[1].query.contains("products"));
    assert_eq!(sent[1].variables["id"], "o2");
}

#[tokio::test]
async fn test_fetch_orders_replaces_collection() {
    let transport = Arc::new(MockTransport::new().with_response(
        "OrdersByStatus",
        json!({ "orders": [order_payload("a", "pending"), order_payload("b", "pending")] }),
    ));
    let (service, store) = service(&transport);
    store.append(order("stale", OrderStatus::Fulfilled));

    let count = service
        .fetch_orders(&TenantId::new("t1"), &OrderStatus::Pending, Selection::Summary)
        .await
        .unwrap();

    assert_eq!(count, 2);
    let ids: Vec<String> = service
        .store()
        .collection()
        .iter()
        .map(|o| o.id().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(service.store().pending_orders().len(), 2);

    let sent = transport.requests_for("OrdersByStatus").remove(0);
    assert_eq!(sent.variables, json!({ "tenantId": "t1", "status": "pending" }));
}

#[tokio::test]
async fn test_fetch_orders_with_bad_element_changes_nothing() {
    let transport = Arc::new(MockTransport::new().with_response(
        "OrdersByStatus",
        json!({ "orders": [order_payload("a", "pending"), { "status": "pending" }] }),
    ));
    let (service, store) = service(&transport);
    store.append(order("kept", OrderStatus::Pending));
    let before = service.store().snapshot();

    let err = service
        .fetch_orders(&TenantId::new("t1"), &OrderStatus::Pending, Selection::Summary)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidPayload(PayloadError::MissingField { field: "id" })
    ));
    assert_eq!(service.store().snapshot(), before);
}

#[tokio::test]
async fn test_transport_failure_propagates_and_leaves_state() {
    let failure = TransportError::Rejected {
        message: "not allowed".into(),
    };
    let transport = Arc::new(
        MockTransport::new()
            .with_error("PlaceOrder", failure.clone())
            .with_error("OrderById", failure.clone()),
    );
    let (service, store) = service(&transport);
    store.replace_current(Some(order("o0", OrderStatus::Pending)));
    let before = service.store().snapshot();

    let err = service
        .place_order(OrderInput::new(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(ref e) if *e == failure));

    let err = service
        .fetch_order(&OrderId::new("o1"), Selection::Summary, FetchTarget::Current)
        .await
        .unwrap_err();
    assert!(err.is_transport());

    assert_eq!(service.store().snapshot(), before);
}

#[tokio::test]
async fn test_missing_response_key_is_invalid_payload() {
    let transport = Arc::new(MockTransport::new().with_response("OrderById", json!({ "order": null })));
    let (service, _) = service(&transport);

    let err = service
        .fetch_order(&OrderId::new("o1"), Selection::Summary, FetchTarget::Current)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidPayload(PayloadError::MissingField { field: "order" })
    ));
    assert!(service.store().current().is_none());
}

#[tokio::test]
async fn test_modify_order_echoes_request_fields() {
    // The response contradicts the request; only the request is applied.
    let transport = Arc::new(MockTransport::new().with_response(
        "ModifyOrder",
        json!({ "updateOrder": { "id": "o1", "status": "pending", "eta": "99m" } }),
    ));
    let (service, store) = service(&transport);
    store.replace_collection(vec![order("o1", OrderStatus::Pending).with_eta("15m")]);
    store.replace_current(Some(order("o1", OrderStatus::Pending).with_eta("15m")));

    let copies = service
        .modify_order(OrderModification::new(OrderId::new("o1")).status(OrderStatus::Fulfilled))
        .await
        .unwrap();

    assert_eq!(copies, 2);
    let snapshot = service.store().snapshot();
    for copy in [&snapshot.collection[0], snapshot.current.as_ref().unwrap()] {
        assert_eq!(copy.status(), Some(&OrderStatus::Fulfilled));
        assert!(copy.is_fulfilled());
        assert_eq!(copy.eta(), Some("15m"));
    }

    let sent = transport.requests_for("ModifyOrder").remove(0);
    assert_eq!(sent.variables["order"], json!({ "id": "o1", "status": "fulfilled" }));
}

#[tokio::test]
async fn test_modify_order_ignores_empty_response_body() {
    let transport = Arc::new(MockTransport::new().with_response("ModifyOrder", json!({})));
    let (service, store) = service(&transport);
    store.append(order("o1", OrderStatus::Pending));

    service
        .modify_order(OrderModification::new(OrderId::new("o1")).eta("10m"))
        .await
        .unwrap();

    assert_eq!(service.store().collection()[0].eta(), Some("10m"));
}

#[tokio::test]
async fn test_modify_order_failure_patches_nothing() {
    let transport = Arc::new(
        MockTransport::new().with_error("ModifyOrder", TransportError::Request("timeout".into())),
    );
    let (service, store) = service(&transport);
    store.append(order("o1", OrderStatus::Pending));

    let result = service
        .modify_order(OrderModification::new(OrderId::new("o1")).status(OrderStatus::Delivering))
        .await;

    assert!(result.unwrap_err().is_transport());
    assert!(service.store().collection()[0].is_pending());
}

#[tokio::test]
async fn test_modify_unknown_order_is_noop_locally() {
    let transport = Arc::new(MockTransport::new().with_response("ModifyOrder", json!({})));
    let (service, _) = service(&transport);

    let copies = service
        .modify_order(OrderModification::new(OrderId::new("elsewhere")).status(OrderStatus::Fulfilled))
        .await
        .unwrap();

    assert_eq!(copies, 0);
    assert_eq!(transport.requests_for("ModifyOrder").len(), 1);
}

#[tokio::test]
async fn test_invalid_identifier_never_reaches_transport() {
    let transport = Arc::new(MockTransport::new());
    let (service, _) = service(&transport);

    let err = service
        .fetch_order(&OrderId::new(""), Selection::Summary, FetchTarget::Current)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidRequest(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_store_changes_are_published() {
    let transport = Arc::new(MockTransport::new().with_response(
        "PlaceOrder",
        json!({ "createOrder": order_payload("o1", "pending") }),
    ));
    let (store, mut rx) = OrderStore::with_notifications(8);
    let service = OrderService::new(transport.clone(), Arc::new(store));

    service.place_order(OrderInput::default()).await.unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        StoreChange::CurrentReplaced {
            id: Some(OrderId::new("o1"))
        }
    );
}

#[tokio::test]
async fn test_modify_order_skips_empty_status() {
    let transport = Arc::new(MockTransport::new().with_response("ModifyOrder", json!({})));
    let (service, store) = service(&transport);
    store.append(order("o1", OrderStatus::Delivering));

    let copies = service
        .modify_order(
            OrderModification::new(OrderId::new("o1"))
                .status(OrderStatus::parse(""))
                .eta("7m"),
        )
        .await
        .unwrap();

    assert_eq!(copies, 1);
    let local = service.store().collection().remove(0);
    assert!(local.is_delivering());
    assert_eq!(local.eta(), Some("7m"));

    let sent = transport.requests_for("ModifyOrder").remove(0);
    assert_eq!(sent.variables["order"], json!({ "id": "o1", "eta": "7m" }));
}
