//! Builders for orders, payloads and live event bodies.

use serde_json::{json, Value};

use crate::domain::{Order, OrderId, OrderStatus};

/// An order carrying only an id and a status.
#[must_use]
pub fn order(id: &str, status: OrderStatus) -> Order {
    Order::new(OrderId::new(id)).with_status(status)
}

/// A summary-shaped order payload as the server would send it.
#[must_use]
pub fn order_payload(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "queueId": "q-1",
        "createdAt": "2024-03-01T10:00:00Z",
        "updatedAt": "2024-03-01T10:00:00Z",
        "status": status,
        "eta": null,
        "totalSum": "18.40"
    })
}

/// A full-shaped order payload, with items and products.
#[must_use]
pub fn full_order_payload(id: &str, status: &str) -> Value {
    let mut payload = order_payload(id, status);
    payload["items"] = json!([{ "productId": "p1", "quantity": 1 }]);
    payload["products"] = json!([{ "id": "p1", "name": "Flat white" }]);
    payload
}

/// Body of an `orderChanged` live event.
#[must_use]
pub fn changed_event(fields: Value) -> Value {
    json!({ "data": { "orderChanged": fields } })
}

/// Body of an `orderCreated` live event.
#[must_use]
pub fn created_event(order: Value) -> Value {
    json!({ "data": { "orderCreated": order } })
}
