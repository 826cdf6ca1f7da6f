//! Container store for orders with optional change notifications.
//!
//! Holds exactly two slots: an ordered `collection` and a singleton
//! `current` order. The same order id may live in both at once; the two
//! copies are independent values and every [`OrderStore::patch`] reaches
//! both under a single write lock.
//!
//! Readers only ever get owned snapshots. Code outside the owning service
//! reads through a [`StoreView`], which has no mutators.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{Order, OrderId, OrderPatch};

/// A slot currently holding a copy of some order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRef {
    /// Position in the collection.
    Collection(usize),
    /// The current-order slot.
    Current,
}

/// Notification sent after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// The collection was replaced wholesale.
    CollectionReplaced { len: usize },
    /// The current slot was replaced or cleared.
    CurrentReplaced { id: Option<OrderId> },
    /// An order was appended to the collection.
    Appended { id: OrderId },
    /// A patch was applied to `copies` resolved references.
    Patched { id: OrderId, copies: usize },
}

/// Point-in-time copy of both slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub collection: Vec<Order>,
    pub current: Option<Order>,
}

#[derive(Debug, Default)]
struct Slots {
    collection: Vec<Order>,
    current: Option<Order>,
}

impl Slots {
    fn resolve(&self, id: &OrderId) -> Vec<SlotRef> {
        let mut refs: Vec<SlotRef> = self
            .collection
            .iter()
            .enumerate()
            .filter(|(_, order)| order.id() == id)
            .map(|(index, _)| SlotRef::Collection(index))
            .collect();

        if self.current.as_ref().is_some_and(|order| order.id() == id) {
            refs.push(SlotRef::Current);
        }
        refs
    }

    fn get_mut(&mut self, slot: SlotRef) -> Option<&mut Order> {
        match slot {
            SlotRef::Collection(index) => self.collection.get_mut(index),
            SlotRef::Current => self.current.as_mut(),
        }
    }
}

/// Single source of truth for the collection and current order.
pub struct OrderStore {
    slots: RwLock<Slots>,
    /// Broadcast sender for change notifications.
    /// Wrapped in Option to allow construction without notifications.
    tx: Option<broadcast::Sender<StoreChange>>,
}

impl OrderStore {
    /// Create an empty store without notifications.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
            tx: None,
        }
    }

    /// Create an empty store with broadcast notifications.
    ///
    /// Returns the store and a receiver for subscribing to changes.
    /// Additional receivers can be created via `subscribe()`. A `capacity`
    /// of zero is raised to one.
    #[must_use]
    pub fn with_notifications(capacity: usize) -> (Self, broadcast::Receiver<StoreChange>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        let store = Self {
            slots: RwLock::new(Slots::default()),
            tx: Some(tx),
        };
        (store, rx)
    }

    /// Subscribe to change notifications.
    ///
    /// Returns `None` if the store was created without notifications.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<StoreChange>> {
        self.tx.as_ref().map(|tx| tx.subscribe())
    }

    fn publish(&self, change: StoreChange) {
        // No receivers is fine
        if let Some(ref tx) = self.tx {
            let _ = tx.send(change);
        }
    }

    /// Every slot whose order currently has identifier `id`.
    ///
    /// Collection matches come first, in index order, then the current slot.
    /// Computed fresh on each call.
    #[must_use]
    pub fn resolve_refs(&self, id: &OrderId) -> Vec<SlotRef> {
        self.slots.read().resolve(id)
    }

    /// Replace the collection wholesale.
    pub fn replace_collection(&self, orders: Vec<Order>) {
        let len = orders.len();
        self.slots.write().collection = orders;
        debug!(len, "Collection replaced");
        self.publish(StoreChange::CollectionReplaced { len });
    }

    /// Replace the current order wholesale.
    pub fn replace_current(&self, order: Option<Order>) {
        let id = order.as_ref().map(|o| o.id().clone());
        self.slots.write().current = order;
        debug!(order_id = ?id, "Current order replaced");
        self.publish(StoreChange::CurrentReplaced { id });
    }

    /// Empty the current slot.
    pub fn clear_current(&self) {
        self.replace_current(None);
    }

    /// Push an order onto the end of the collection. No dedup is performed.
    pub fn append(&self, order: Order) {
        let id = order.id().clone();
        self.slots.write().collection.push(order);
        debug!(order_id = %id, "Order appended");
        self.publish(StoreChange::Appended { id });
    }

    /// Apply `patch` in place to every copy of order `id`.
    ///
    /// Returns the number of copies patched. When nothing holds `id` the
    /// patch is dropped.
    pub fn patch(&self, id: &OrderId, patch: &OrderPatch) -> usize {
        let copies = {
            let mut slots = self.slots.write();
            let refs = slots.resolve(id);
            for slot in &refs {
                if let Some(order) = slots.get_mut(*slot) {
                    order.apply(patch);
                }
            }
            refs.len()
        };

        if copies == 0 {
            debug!(order_id = %id, "No local copy, patch dropped");
            return 0;
        }

        debug!(order_id = %id, copies, fields = ?patch.fields(), "Order patched");
        self.publish(StoreChange::Patched {
            id: id.clone(),
            copies,
        });
        copies
    }

    /// Get a snapshot of both slots.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let slots = self.slots.read();
        StoreSnapshot {
            collection: slots.collection.clone(),
            current: slots.current.clone(),
        }
    }

    /// Get a snapshot of the collection.
    #[must_use]
    pub fn collection(&self) -> Vec<Order> {
        self.slots.read().collection.clone()
    }

    /// Get a snapshot of the current order.
    #[must_use]
    pub fn current(&self) -> Option<Order> {
        self.slots.read().current.clone()
    }

    /// Get a snapshot of the first copy of order `id`.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<Order> {
        let slots = self.slots.read();
        let slot = slots.resolve(id).into_iter().next()?;
        match slot {
            SlotRef::Collection(index) => slots.collection.get(index).cloned(),
            SlotRef::Current => slots.current.clone(),
        }
    }

    /// Returns true if any slot holds order `id`.
    #[must_use]
    pub fn contains(&self, id: &OrderId) -> bool {
        !self.resolve_refs(id).is_empty()
    }

    /// Pending orders in the collection.
    #[must_use]
    pub fn pending_orders(&self) -> Vec<Order> {
        self.filter_collection(Order::is_pending)
    }

    /// Orders in the collection currently being delivered.
    #[must_use]
    pub fn delivering_orders(&self) -> Vec<Order> {
        self.filter_collection(Order::is_delivering)
    }

    /// Fulfilled orders in the collection.
    #[must_use]
    pub fn fulfilled_orders(&self) -> Vec<Order> {
        self.filter_collection(Order::is_fulfilled)
    }

    fn filter_collection(&self, predicate: fn(&Order) -> bool) -> Vec<Order> {
        self.slots
            .read()
            .collection
            .iter()
            .filter(|order| predicate(order))
            .cloned()
            .collect()
    }

    /// Number of orders in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().collection.len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle to an [`OrderStore`].
#[derive(Clone)]
pub struct StoreView {
    store: Arc<OrderStore>,
}

impl StoreView {
    pub(crate) fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    #[must_use]
    pub fn collection(&self) -> Vec<Order> {
        self.store.collection()
    }

    #[must_use]
    pub fn current(&self) -> Option<Order> {
        self.store.current()
    }

    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<Order> {
        self.store.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &OrderId) -> bool {
        self.store.contains(id)
    }

    #[must_use]
    pub fn resolve_refs(&self, id: &OrderId) -> Vec<SlotRef> {
        self.store.resolve_refs(id)
    }

    #[must_use]
    pub fn pending_orders(&self) -> Vec<Order> {
        self.store.pending_orders()
    }

    #[must_use]
    pub fn delivering_orders(&self) -> Vec<Order> {
        self.store.delivering_orders()
    }

    #[must_use]
    pub fn fulfilled_orders(&self) -> Vec<Order> {
        self.store.fulfilled_orders()
    }

    /// Subscribe to change notifications, if the store publishes them.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<StoreChange>> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for StoreView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreView")
            .field("len", &self.len())
            .field("has_current", &self.current().is_some())
            .finish()
    }
}
