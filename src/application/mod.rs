//! Application services (use cases).
//!
//! These services keep the order slots in step with the backend:
//!
//! - [`store`] - Container store: slots, reference resolution, merging
//! - [`subscription`] - Registry of open live channels
//! - [`request`] - Structured requests rendered into wire form
//! - [`service`] - Query/mutation façade tying the above to a transport

pub mod request;
pub mod service;
pub mod store;
pub mod subscription;

pub use request::{OrderInput, OrderModification, OrderRequest, RequestError, Selection};
pub use service::{BootstrapSummary, FetchTarget, OrderService};
pub use store::{OrderStore, SlotRef, StoreChange, StoreSnapshot, StoreView};
pub use subscription::{
    DisconnectFailure, SubscriptionId, SubscriptionKind, SubscriptionRegistry, TeardownReport,
};
