//! order-sync - in-memory order cache kept in step with a live backend.
//!
//! The cache holds one entity kind (orders) in two slots: an ordered
//! collection and a singleton "current" order. Both are fed by request and
//! response calls against a GraphQL-style transport and by long-lived push
//! channels. When the same order sits in both slots, every patch reaches both
//! copies.
//!
//! # Modules
//!
//! - [`domain`] - Order entity, status predicates, typed ids and patches
//! - [`port`] - Transport traits implemented by the external client
//! - [`application`] - Container store, subscription registry, request
//!   builder and the [`application::service::OrderService`] façade
//! - [`infrastructure`] - Configuration loading and logging setup
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Mock transport and channel handles for integration tests
//!
//! # Example
//!
//! ```
//! use order_sync::application::store::OrderStore;
//! use order_sync::domain::{Order, OrderId, OrderPatch, OrderStatus};
//!
//! let store = OrderStore::new();
//! store.append(Order::new(OrderId::new("o1")).with_status(OrderStatus::Pending));
//!
//! let patch = OrderPatch::new().status(OrderStatus::Delivering);
//! assert_eq!(store.patch(&OrderId::new("o1"), &patch), 1);
//! assert!(store.collection()[0].is_delivering());
//! ```

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
