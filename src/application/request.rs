//! Structured order requests rendered into wire form.
//!
//! Every operation is an [`OrderRequest`] value carrying typed variables. It
//! is validated first and then rendered into a [`WireRequest`] whose query
//! text is fixed per operation; identifiers only ever travel in `variables`.

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::{OrderId, OrderPatch, OrderStatus, TenantId};
use crate::port::WireRequest;

/// Upper bound for identifiers sent as variables.
pub const MAX_IDENTIFIER_LEN: usize = 256;

const SUMMARY_FIELDS: &str = "id queueId createdAt updatedAt status eta totalSum";
const FULL_EXTRA_FIELDS: &str = "items products { id name }";
const ECHO_FIELDS: &str = "id status eta";

/// Request validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("invalid {field}: {reason}")]
    InvalidIdentifier { field: &'static str, reason: String },

    #[error("failed to encode variables: {0}")]
    Encode(String),
}

/// Field set requested for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Identifier, queue id, timestamps, status, eta and total.
    #[default]
    Summary,
    /// Summary plus items and product summaries.
    Full,
    /// Identifier, status and eta. Used for update responses.
    Echo,
}

impl Selection {
    /// Pick summary or full from a boolean flag.
    #[must_use]
    pub fn from_full(full: bool) -> Self {
        if full {
            Selection::Full
        } else {
            Selection::Summary
        }
    }

    /// Render the selection body.
    #[must_use]
    pub fn render(self) -> String {
        match self {
            Selection::Summary => SUMMARY_FIELDS.to_string(),
            Selection::Full => format!("{SUMMARY_FIELDS} {FULL_EXTRA_FIELDS}"),
            Selection::Echo => ECHO_FIELDS.to_string(),
        }
    }
}

/// Input for placing a new order.
///
/// Only `items` is known to this crate; any other input fields pass through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderInput {
    pub items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderInput {
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            extra: Map::new(),
        }
    }

    /// Add a pass-through input field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// A partial update of an existing order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderModification {
    pub id: OrderId,
    pub status: Option<OrderStatus>,
    pub eta: Option<String>,
}

impl OrderModification {
    #[must_use]
    pub fn new(id: OrderId) -> Self {
        Self {
            id,
            status: None,
            eta: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn eta(mut self, eta: impl Into<String>) -> Self {
        self.eta = Some(eta.into());
        self
    }

    /// An empty status counts as not provided.
    fn provided_status(&self) -> Option<&OrderStatus> {
        self.status
            .as_ref()
            .filter(|status| !status.as_str().is_empty())
    }

    /// An empty eta counts as not provided.
    fn provided_eta(&self) -> Option<&str> {
        self.eta.as_deref().filter(|eta| !eta.is_empty())
    }

    /// The update payload: the id plus only the fields provided.
    #[must_use]
    pub fn payload(&self) -> Value {
        let mut order = Map::new();
        order.insert("id".into(), Value::String(self.id.to_string()));
        if let Some(status) = self.provided_status() {
            order.insert("status".into(), Value::String(status.to_string()));
        }
        if let Some(eta) = self.provided_eta() {
            order.insert("eta".into(), Value::String(eta.to_string()));
        }
        Value::Object(order)
    }

    /// The same fields as [`OrderModification::payload`], as a local patch.
    #[must_use]
    pub fn patch(&self) -> OrderPatch {
        let mut patch = OrderPatch::new();
        if let Some(status) = self.provided_status() {
            patch = patch.status(status.clone());
        }
        if let Some(eta) = self.provided_eta() {
            patch = patch.eta(eta);
        }
        patch
    }
}

/// Every request the order service issues.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderRequest {
    /// Single order by id.
    Order { id: OrderId, selection: Selection },
    /// Orders of a tenant filtered by status.
    Orders {
        tenant_id: TenantId,
        status: OrderStatus,
        selection: Selection,
    },
    /// Place a new order.
    CreateOrder { input: OrderInput },
    /// Partially update an order.
    UpdateOrder { modification: OrderModification },
    /// Live changes of one order.
    OrderChanged { id: OrderId },
    /// Live creation events for all orders.
    OrderCreated,
}

impl OrderRequest {
    #[must_use]
    pub fn operation_name(&self) -> &'static str {
        match self {
            OrderRequest::Order { .. } => "OrderById",
            OrderRequest::Orders { .. } => "OrdersByStatus",
            OrderRequest::CreateOrder { .. } => "PlaceOrder",
            OrderRequest::UpdateOrder { .. } => "ModifyOrder",
            OrderRequest::OrderChanged { .. } => "OrderChanged",
            OrderRequest::OrderCreated => "OrderCreated",
        }
    }

    /// Key of the result inside the response or event `data` object.
    #[must_use]
    pub fn response_key(&self) -> &'static str {
        match self {
            OrderRequest::Order { .. } => "order",
            OrderRequest::Orders { .. } => "orders",
            OrderRequest::CreateOrder { .. } => "createOrder",
            OrderRequest::UpdateOrder { .. } => "updateOrder",
            OrderRequest::OrderChanged { .. } => "orderChanged",
            OrderRequest::OrderCreated => "orderCreated",
        }
    }

    /// Check every identifier carried by the request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidIdentifier`] for empty, oversized or
    /// control-character identifiers.
    pub fn validate(&self) -> Result<(), RequestError> {
        match self {
            OrderRequest::Order { id, .. } | OrderRequest::OrderChanged { id } => {
                check_identifier("id", id.as_str())
            }
            OrderRequest::Orders {
                tenant_id, status, ..
            } => {
                check_identifier("tenantId", tenant_id.as_str())?;
                check_identifier("status", status.as_str())
            }
            OrderRequest::UpdateOrder { modification } => {
                check_identifier("id", modification.id.as_str())
            }
            OrderRequest::CreateOrder { .. } | OrderRequest::OrderCreated => Ok(()),
        }
    }

    /// Validate and render into wire form.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] if validation or variable encoding fails.
    pub fn to_wire(&self) -> Result<WireRequest, RequestError> {
        self.validate()?;

        let name = self.operation_name();
        let key = self.response_key();
        let (query, variables) = match self {
            OrderRequest::Order { id, selection } => (
                format!(
                    "query {name}($id: ID!) {{ {key}(id: $id) {{ {} }} }}",
                    selection.render()
                ),
                json!({ "id": id }),
            ),
            OrderRequest::Orders {
                tenant_id,
                status,
                selection,
            } => (
                format!(
                    "query {name}($tenantId: ID!, $status: String!) {{ {key}(tenantId: $tenantId, status: $status) {{ {} }} }}",
                    selection.render()
                ),
                json!({ "tenantId": tenant_id, "status": status }),
            ),
            OrderRequest::CreateOrder { input } => {
                let order =
                    serde_json::to_value(input).map_err(|e| RequestError::Encode(e.to_string()))?;
                (
                    format!(
                        "mutation {name}($order: OrderInput!) {{ {key}(order: $order) {{ {} }} }}",
                        Selection::Summary.render()
                    ),
                    json!({ "order": order }),
                )
            }
            OrderRequest::UpdateOrder { modification } => (
                format!(
                    "mutation {name}($order: OrderUpdateInput!) {{ {key}(order: $order) {{ {} }} }}",
                    Selection::Echo.render()
                ),
                json!({ "order": modification.payload() }),
            ),
            OrderRequest::OrderChanged { id } => (
                format!(
                    "subscription {name}($id: ID!) {{ {key}(id: $id) {{ {} }} }}",
                    Selection::Summary.render()
                ),
                json!({ "id": id }),
            ),
            OrderRequest::OrderCreated => (
                format!(
                    "subscription {name} {{ {key} {{ {} }} }}",
                    Selection::Full.render()
                ),
                Value::Null,
            ),
        };

        Ok(WireRequest {
            operation_name: name.to_string(),
            query,
            variables,
        })
    }
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), RequestError> {
    let reason = if value.is_empty() {
        "must not be empty".to_string()
    } else if value.len() > MAX_IDENTIFIER_LEN {
        format!("longer than {MAX_IDENTIFIER_LEN} bytes")
    } else if value.chars().any(char::is_control) {
        "contains control characters".to_string()
    } else {
        return Ok(());
    };
    Err(RequestError::InvalidIdentifier { field, reason })
}
