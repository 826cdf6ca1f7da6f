//! Payload validation errors for the order entity.
//!
//! Returned when a response body or live event cannot be turned into an
//! [`Order`](super::Order) or [`OrderPatch`](super::OrderPatch).
//!
//! # Examples
//!
//! ```
//! use order_sync::domain::error::PayloadError;
//! use order_sync::domain::Order;
//! use serde_json::json;
//!
//! let result = Order::from_payload(&json!({ "status": "pending" }));
//! assert!(matches!(result, Err(PayloadError::MissingField { field: "id" })));
//! ```

use thiserror::Error;

/// Errors raised while normalizing raw order data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    /// The payload was not a JSON object.
    #[error("expected an object, got {found}")]
    NotAnObject {
        /// JSON type name of what was received.
        found: &'static str,
    },

    /// A required field was absent, null or empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// Wire name of the field.
        field: &'static str,
    },

    /// A field was present but could not be coerced.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Wire name of the field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The raw body was not valid JSON.
    #[error("malformed JSON: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        PayloadError::Malformed(err.to_string())
    }
}
