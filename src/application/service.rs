//! Query/mutation façade over the transport.
//!
//! [`OrderService`] issues a request, normalizes the response into orders and
//! mutates the [`OrderStore`]. Live channels opened here are owned by the
//! service's [`SubscriptionRegistry`] and feed the store through
//! [`OrderStore::patch`] and [`OrderStore::append`].
//!
//! A failed request mutates nothing: the store is only touched once the
//! response has been fully normalized.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::request::{OrderInput, OrderModification, OrderRequest, Selection};
use super::store::{OrderStore, StoreChange, StoreView};
use super::subscription::{SubscriptionId, SubscriptionKind, SubscriptionRegistry, TeardownReport};
use crate::domain::{Order, OrderId, OrderPatch, OrderStatus, PayloadError, TenantId};
use crate::error::{Error, Result};
use crate::infrastructure::config::SyncConfig;
use crate::port::{ChannelMessage, MessageHandler, Transport, MESSAGE_EVENT};

/// Slot a single fetched order lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchTarget {
    /// Appended to the collection.
    Collection,
    /// Replaces the current order.
    #[default]
    Current,
}

/// What [`OrderService::bootstrap`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapSummary {
    /// Orders loaded into the collection, if a list fetch ran.
    pub fetched: Option<usize>,
    /// Subscriptions opened, in order.
    pub subscriptions: Vec<SubscriptionId>,
}

/// Façade for fetching, placing and modifying orders and for live updates.
pub struct OrderService {
    transport: Arc<dyn Transport>,
    store: Arc<OrderStore>,
    registry: Mutex<SubscriptionRegistry>,
}

impl OrderService {
    /// Create a service writing into `store`.
    pub fn new(transport: Arc<dyn Transport>, store: Arc<OrderStore>) -> Self {
        Self {
            transport,
            store,
            registry: Mutex::new(SubscriptionRegistry::new()),
        }
    }

    /// Create a service with a fresh store sized from `config`.
    ///
    /// Returns the service and a receiver for store changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        config: &SyncConfig,
    ) -> Result<(Self, broadcast::Receiver<StoreChange>)> {
        config.validate()?;
        let (store, rx) = OrderStore::with_notifications(config.notify_capacity);
        Ok((Self::new(transport, Arc::new(store)), rx))
    }

    /// Read-only view of the store this service writes into.
    #[must_use]
    pub fn store(&self) -> StoreView {
        StoreView::new(Arc::clone(&self.store))
    }

    /// Fetch one order and place it in `target`.
    ///
    /// # Errors
    ///
    /// Returns the transport failure unchanged, or
    /// [`Error::InvalidPayload`] if the response holds no usable order.
    pub async fn fetch_order(
        &self,
        id: &OrderId,
        selection: Selection,
        target: FetchTarget,
    ) -> Result<Order> {
        let request = OrderRequest::Order {
            id: id.clone(),
            selection,
        };
        let data = self.execute(&request).await?;
        let order = Order::from_payload(response_field(&data, request.response_key())?)?;

        match target {
            FetchTarget::Collection => self.store.append(order.clone()),
            FetchTarget::Current => self.store.replace_current(Some(order.clone())),
        }
        info!(order_id = %order.id(), target = ?target, "Order fetched");
        Ok(order)
    }

    /// Fetch a tenant's orders with `status` and replace the collection.
    ///
    /// Returns the number of orders loaded.
    ///
    /// # Errors
    ///
    /// Returns the transport failure unchanged, or
    /// [`Error::InvalidPayload`] if any element cannot be normalized. In both
    /// cases the collection is left as it was.
    pub async fn fetch_orders(
        &self,
        tenant_id: &TenantId,
        status: &OrderStatus,
        selection: Selection,
    ) -> Result<usize> {
        let request = OrderRequest::Orders {
            tenant_id: tenant_id.clone(),
            status: status.clone(),
            selection,
        };
        let data = self.execute(&request).await?;
        let key = request.response_key();
        let elements = response_field(&data, key)?
            .as_array()
            .ok_or_else(|| PayloadError::InvalidField {
                field: key,
                reason: "expected an array".into(),
            })?;

        let orders = elements
            .iter()
            .map(Order::from_payload)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let count = orders.len();

        self.store.replace_collection(orders);
        info!(tenant_id = %tenant_id, status = %status, count, "Orders fetched");
        Ok(count)
    }

    /// Place a new order. It becomes the current order; the collection is
    /// not touched.
    ///
    /// # Errors
    ///
    /// Returns the transport failure unchanged, or
    /// [`Error::InvalidPayload`] if the response holds no usable order.
    pub async fn place_order(&self, input: OrderInput) -> Result<Order> {
        let request = OrderRequest::CreateOrder { input };
        let data = self.execute(&request).await?;
        let order = Order::from_payload(response_field(&data, request.response_key())?)?;

        self.store.replace_current(Some(order.clone()));
        info!(order_id = %order.id(), "Order placed");
        Ok(order)
    }

    /// Send a partial update and, once the transport reports success, apply
    /// the same fields locally.
    ///
    /// The response body is not consulted. A server that alters or rejects
    /// the update while still answering successfully leaves local state out
    /// of step with it.
    ///
    /// Returns the number of local copies patched.
    ///
    /// # Errors
    ///
    /// Returns the transport failure unchanged; nothing is patched then.
    pub async fn modify_order(&self, modification: OrderModification) -> Result<usize> {
        let patch = modification.patch();
        let id = modification.id.clone();
        let request = OrderRequest::UpdateOrder { modification };
        self.execute(&request).await?;

        let copies = self.store.patch(&id, &patch);
        info!(order_id = %id, fields = ?patch.fields(), copies, "Order modified");
        Ok(copies)
    }

    /// Open a live channel for changes of order `id`.
    ///
    /// Returns `Ok(None)` without opening anything if no slot holds `id`.
    ///
    /// # Errors
    ///
    /// Returns the transport failure if the channel cannot be opened or
    /// started; nothing is registered then.
    pub async fn subscribe_order_changed(&self, id: &OrderId) -> Result<Option<SubscriptionId>> {
        if self.store.resolve_refs(id).is_empty() {
            debug!(order_id = %id, "Order not held locally, not subscribing");
            return Ok(None);
        }

        let request = OrderRequest::OrderChanged { id: id.clone() };
        let key = request.response_key();
        let store = Arc::clone(&self.store);
        let order_id = id.clone();

        let handler: MessageHandler = Box::new(move |message: ChannelMessage| {
            let update = event_body(&message, key)
                .and_then(|body| OrderPatch::from_payload(&body).map_err(Error::from));
            match update {
                Ok(patch) => {
                    store.patch(&order_id, &patch);
                }
                Err(e) => {
                    error!(order_id = %order_id, error = %e, "Dropping {key} event");
                }
            }
        });

        let kind = SubscriptionKind::OrderChanged(id.clone());
        self.open(&request, kind, handler).await.map(Some)
    }

    /// Open a live channel for creation of any order.
    ///
    /// # Errors
    ///
    /// Returns the transport failure if the channel cannot be opened or
    /// started; nothing is registered then.
    pub async fn subscribe_order_created(&self) -> Result<SubscriptionId> {
        let request = OrderRequest::OrderCreated;
        let key = request.response_key();
        let store = Arc::clone(&self.store);

        let handler: MessageHandler = Box::new(move |message: ChannelMessage| {
            let created = event_body(&message, key)
                .and_then(|body| Order::from_payload(&body).map_err(Error::from));
            match created {
                Ok(order) => store.append(order),
                Err(e) => error!(error = %e, "Dropping {key} event"),
            }
        });

        self.open(&request, SubscriptionKind::OrderCreated, handler)
            .await
    }

    /// Disconnect and drop every open subscription.
    pub fn clear_subscriptions(&self) -> TeardownReport {
        self.registry.lock().clear_all()
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Kinds of the open subscriptions, in registration order.
    #[must_use]
    pub fn subscription_kinds(&self) -> Vec<SubscriptionKind> {
        self.registry.lock().kinds()
    }

    /// Load the configured tenant's orders and open the configured channels.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step. Subscriptions opened before the
    /// failure stay registered.
    pub async fn bootstrap(&self, config: &SyncConfig) -> Result<BootstrapSummary> {
        let mut summary = BootstrapSummary::default();

        if let Some(tenant) = &config.tenant_id {
            let status = OrderStatus::parse(&config.status);
            let fetched = self
                .fetch_orders(
                    &TenantId::new(tenant.as_str()),
                    &status,
                    Selection::from_full(config.full),
                )
                .await?;
            summary.fetched = Some(fetched);
        }

        if config.subscribe_created {
            summary
                .subscriptions
                .push(self.subscribe_order_created().await?);
        }

        if config.watch_collection {
            for order in self.store.collection() {
                if let Some(id) = self.subscribe_order_changed(order.id()).await? {
                    summary.subscriptions.push(id);
                }
            }
        }

        info!(
            fetched = ?summary.fetched,
            subscriptions = summary.subscriptions.len(),
            transport = self.transport.transport_name(),
            "Bootstrap complete"
        );
        Ok(summary)
    }

    async fn execute(&self, request: &OrderRequest) -> Result<Value> {
        let wire = request.to_wire()?;
        debug!(operation = %wire.operation_name, "Sending request");
        let data = self.transport.request(&wire).await?;
        Ok(data)
    }

    async fn open(
        &self,
        request: &OrderRequest,
        kind: SubscriptionKind,
        handler: MessageHandler,
    ) -> Result<SubscriptionId> {
        let wire = request.to_wire()?;
        let mut channel = self.transport.open_channel(&wire).await?;
        channel.add_listener(MESSAGE_EVENT, handler);

        if let Err(e) = channel.start() {
            if let Err(close) = channel.disconnect() {
                warn!(kind = %kind, error = %close, "Disconnect after failed start also failed");
            }
            return Err(e.into());
        }

        let id = self.registry.lock().register(kind.clone(), channel);
        info!(subscription = %id, kind = %kind, "Subscribed");
        Ok(id)
    }
}

/// The non-null value under `key` in a response `data` object.
fn response_field<'a>(data: &'a Value, key: &'static str) -> Result<&'a Value> {
    data.get(key)
        .filter(|value| !value.is_null())
        .ok_or(Error::InvalidPayload(PayloadError::MissingField { field: key }))
}

/// Parse a live event and take the value under `data.<key>`.
fn event_body(message: &ChannelMessage, key: &'static str) -> Result<Value> {
    let mut body: Value = serde_json::from_str(&message.data).map_err(PayloadError::from)?;
    body.get_mut("data")
        .and_then(|data| data.get_mut(key))
        .filter(|value| !value.is_null())
        .map(Value::take)
        .ok_or(Error::EventShapeMismatch { expected: key })
}
