//! Order entity, its status and field-level patches.
//!
//! Orders are built from raw response payloads with [`Order::from_payload`].
//! Push updates arrive as partial payloads and become an [`OrderPatch`],
//! which is applied in place with [`Order::apply`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::PayloadError;
use super::id::OrderId;

/// Lifecycle state of an order.
///
/// Parsing is ASCII case-insensitive. Unknown states are kept verbatim in
/// [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed, not yet picked up.
    Pending,
    /// On its way.
    Delivering,
    /// Handed over.
    Fulfilled,
    /// Any other domain-specific state.
    Other(String),
}

impl OrderStatus {
    /// Parse a wire status string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("pending") {
            OrderStatus::Pending
        } else if raw.eq_ignore_ascii_case("delivering") {
            OrderStatus::Delivering
        } else if raw.eq_ignore_ascii_case("fulfilled") {
            OrderStatus::Fulfilled
        } else {
            OrderStatus::Other(raw.to_string())
        }
    }

    /// Wire form of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Product line shown on an order (`products { id name }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: Option<String>,
}

impl ProductSummary {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// An order as held by the store.
///
/// Status predicates are computed from `status` on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    queue_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    status: Option<OrderStatus>,
    eta: Option<String>,
    total_sum: Option<Decimal>,
    items: Vec<Value>,
    products: Vec<ProductSummary>,
}

impl Order {
    /// Create an order with only its identifier set.
    #[must_use]
    pub fn new(id: OrderId) -> Self {
        Self {
            id,
            queue_id: None,
            created_at: None,
            updated_at: None,
            status: None,
            eta: None,
            total_sum: None,
            items: Vec::new(),
            products: Vec::new(),
        }
    }

    /// Normalize a raw response or event payload into an order.
    ///
    /// Only `id` is required. Missing optional fields default to absent or
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::MissingField`] when `id` is absent, null or
    /// empty, and [`PayloadError::InvalidField`] when a present field has an
    /// unusable type.
    pub fn from_payload(raw: &Value) -> Result<Self, PayloadError> {
        let obj = as_object(raw)?;

        let id = match obj.get("id") {
            Some(value) => scalar_string("id", value)?,
            None => None,
        }
        .filter(|id| !id.is_empty())
        .ok_or(PayloadError::MissingField { field: "id" })?;

        let mut order = Order::new(OrderId::new(id));
        order.apply(&OrderPatch::from_object(obj)?);
        Ok(order)
    }

    #[must_use]
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_eta(mut self, eta: impl Into<String>) -> Self {
        self.eta = Some(eta.into());
        self
    }

    #[must_use]
    pub fn with_total_sum(mut self, total_sum: Decimal) -> Self {
        self.total_sum = Some(total_sum);
        self
    }

    #[must_use]
    pub fn with_queue_id(mut self, queue_id: impl Into<String>) -> Self {
        self.queue_id = Some(queue_id.into());
        self
    }

    /// Apply every entry of `patch` in place. Fields without an entry are
    /// left untouched.
    pub fn apply(&mut self, patch: &OrderPatch) {
        if let Some(queue_id) = &patch.queue_id {
            self.queue_id.clone_from(queue_id);
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = created_at;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
        if let Some(status) = &patch.status {
            self.status.clone_from(status);
        }
        if let Some(eta) = &patch.eta {
            self.eta.clone_from(eta);
        }
        if let Some(total_sum) = patch.total_sum {
            self.total_sum = total_sum;
        }
        if let Some(items) = &patch.items {
            self.items.clone_from(items);
        }
        if let Some(products) = &patch.products {
            self.products.clone_from(products);
        }
    }

    #[must_use]
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    #[must_use]
    pub fn queue_id(&self) -> Option<&str> {
        self.queue_id.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    #[must_use]
    pub fn status(&self) -> Option<&OrderStatus> {
        self.status.as_ref()
    }

    #[must_use]
    pub fn eta(&self) -> Option<&str> {
        self.eta.as_deref()
    }

    #[must_use]
    pub fn total_sum(&self) -> Option<Decimal> {
        self.total_sum
    }

    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    #[must_use]
    pub fn products(&self) -> &[ProductSummary] {
        &self.products
    }

    /// Returns true if the order is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.status, Some(OrderStatus::Pending))
    }

    /// Returns true if the order is being delivered.
    #[must_use]
    pub fn is_delivering(&self) -> bool {
        matches!(self.status, Some(OrderStatus::Delivering))
    }

    /// Returns true if the order is fulfilled.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        matches!(self.status, Some(OrderStatus::Fulfilled))
    }
}

/// A partial, field-level update for an order.
///
/// Each entry is `None` when the field is untouched. Nullable fields carry an
/// inner `Option`: `Some(None)` clears the field. The identifier is never
/// part of a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    queue_id: Option<Option<String>>,
    created_at: Option<Option<DateTime<Utc>>>,
    updated_at: Option<Option<DateTime<Utc>>>,
    status: Option<Option<OrderStatus>>,
    eta: Option<Option<String>>,
    total_sum: Option<Option<Decimal>>,
    items: Option<Vec<Value>>,
    products: Option<Vec<ProductSummary>>,
}

impl OrderPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch from the keys present in a partial payload.
    ///
    /// An explicit `null` clears the field. `id` is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] if the payload is not an object or a
    /// present field cannot be coerced.
    pub fn from_payload(raw: &Value) -> Result<Self, PayloadError> {
        Self::from_object(as_object(raw)?)
    }

    fn from_object(obj: &Map<String, Value>) -> Result<Self, PayloadError> {
        let mut patch = Self::new();
        if let Some(value) = obj.get("queueId") {
            patch.queue_id = Some(scalar_string("queueId", value)?);
        }
        if let Some(value) = obj.get("createdAt") {
            patch.created_at = Some(timestamp("createdAt", value)?);
        }
        if let Some(value) = obj.get("updatedAt") {
            patch.updated_at = Some(timestamp("updatedAt", value)?);
        }
        if let Some(value) = obj.get("status") {
            patch.status = Some(status(value)?);
        }
        if let Some(value) = obj.get("eta") {
            patch.eta = Some(scalar_string("eta", value)?);
        }
        if let Some(value) = obj.get("totalSum") {
            patch.total_sum = Some(decimal("totalSum", value)?);
        }
        if let Some(value) = obj.get("items") {
            patch.items = Some(items(value)?);
        }
        if let Some(value) = obj.get("products") {
            patch.products = Some(products(value)?);
        }
        Ok(patch)
    }

    #[must_use]
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(Some(status));
        self
    }

    #[must_use]
    pub fn eta(mut self, eta: impl Into<String>) -> Self {
        self.eta = Some(Some(eta.into()));
        self
    }

    #[must_use]
    pub fn clear_eta(mut self) -> Self {
        self.eta = Some(None);
        self
    }

    #[must_use]
    pub fn queue_id(mut self, queue_id: impl Into<String>) -> Self {
        self.queue_id = Some(Some(queue_id.into()));
        self
    }

    #[must_use]
    pub fn total_sum(mut self, total_sum: Decimal) -> Self {
        self.total_sum = Some(Some(total_sum));
        self
    }

    #[must_use]
    pub fn items(mut self, items: Vec<Value>) -> Self {
        self.items = Some(items);
        self
    }

    #[must_use]
    pub fn products(mut self, products: Vec<ProductSummary>) -> Self {
        self.products = Some(products);
        self
    }

    /// Wire names of the fields this patch touches.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        let entries = [
            ("queueId", self.queue_id.is_some()),
            ("createdAt", self.created_at.is_some()),
            ("updatedAt", self.updated_at.is_some()),
            ("status", self.status.is_some()),
            ("eta", self.eta.is_some()),
            ("totalSum", self.total_sum.is_some()),
            ("items", self.items.is_some()),
            ("products", self.products.is_some()),
        ];
        entries
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    /// True when the patch touches no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_object(raw: &Value) -> Result<&Map<String, Value>, PayloadError> {
    raw.as_object().ok_or(PayloadError::NotAnObject {
        found: json_type(raw),
    })
}

fn invalid(field: &'static str, expected: &str, value: &Value) -> PayloadError {
    PayloadError::InvalidField {
        field,
        reason: format!("expected {expected}, got {}", json_type(value)),
    }
}

fn scalar_string(field: &'static str, value: &Value) -> Result<Option<String>, PayloadError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(invalid(field, "string", other)),
    }
}

fn timestamp(field: &'static str, value: &Value) -> Result<Option<DateTime<Utc>>, PayloadError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| PayloadError::InvalidField {
                field,
                reason: e.to_string(),
            }),
        other => Err(invalid(field, "RFC 3339 timestamp", other)),
    }
}

fn decimal(field: &'static str, value: &Value) -> Result<Option<Decimal>, PayloadError> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(invalid(field, "decimal", other)),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|e| PayloadError::InvalidField {
            field,
            reason: e.to_string(),
        })
}

fn status(value: &Value) -> Result<Option<OrderStatus>, PayloadError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(OrderStatus::parse(s))),
        other => Err(invalid("status", "string", other)),
    }
}

fn items(value: &Value) -> Result<Vec<Value>, PayloadError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.clone()),
        other => Err(invalid("items", "array", other)),
    }
}

fn products(value: &Value) -> Result<Vec<ProductSummary>, PayloadError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => return Err(invalid("products", "array", other)),
    };

    entries
        .iter()
        .map(|entry| {
            let obj = entry
                .as_object()
                .ok_or_else(|| invalid("products", "array of objects", entry))?;
            let id = match obj.get("id") {
                Some(value) => scalar_string("products.id", value)?,
                None => None,
            }
            .ok_or(PayloadError::MissingField {
                field: "products.id",
            })?;
            let name = match obj.get("name") {
                Some(value) => scalar_string("products.name", value)?,
                None => None,
            };
            Ok(ProductSummary { id, name })
        })
        .collect()
}
