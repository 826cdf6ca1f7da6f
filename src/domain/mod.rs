//! Order entity model: identifiers, status, normalization and patches.

pub mod error;
pub mod id;
pub mod order;

pub use error::PayloadError;
pub use id::{OrderId, TenantId};
pub use order::{Order, OrderPatch, OrderStatus, ProductSummary};
