//! Registry of open live channels.
//!
//! The registry owns every channel handle once it is registered. Teardown is
//! all-or-nothing through [`SubscriptionRegistry::clear_all`]; there is no
//! per-subscription cancel.

use std::fmt;

use tracing::{debug, info, warn};

use crate::domain::OrderId;
use crate::port::{LiveChannel, TransportError};

/// Identifier assigned to a registered subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Get the underlying value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionKind {
    /// Changes of one order.
    OrderChanged(OrderId),
    /// Creation of any order.
    OrderCreated,
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionKind::OrderChanged(id) => write!(f, "orderChanged({id})"),
            SubscriptionKind::OrderCreated => f.write_str("orderCreated"),
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    kind: SubscriptionKind,
    channel: Box<dyn LiveChannel>,
}

/// A disconnect that failed during teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectFailure {
    pub id: SubscriptionId,
    pub kind: SubscriptionKind,
    pub error: TransportError,
}

/// Outcome of [`SubscriptionRegistry::clear_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    /// Handles whose disconnect succeeded.
    pub disconnected: usize,
    /// Handles whose disconnect failed. They are dropped all the same.
    pub failures: Vec<DisconnectFailure>,
}

impl TeardownReport {
    /// Total handles torn down, failed or not.
    #[must_use]
    pub fn total(&self) -> usize {
        self.disconnected + self.failures.len()
    }

    /// True when every disconnect succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owner of all open channel handles, in registration order.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a channel handle.
    pub fn register(
        &mut self,
        kind: SubscriptionKind,
        channel: Box<dyn LiveChannel>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        debug!(subscription = %id, kind = %kind, "Subscription registered");
        self.subscriptions.push(Subscription { id, kind, channel });
        id
    }

    /// Disconnect every handle, then empty the registry.
    ///
    /// A failed disconnect does not stop the rest; it is logged and recorded
    /// in the returned report.
    pub fn clear_all(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();

        for mut sub in self.subscriptions.drain(..) {
            match sub.channel.disconnect() {
                Ok(()) => report.disconnected += 1,
                Err(error) => {
                    warn!(
                        subscription = %sub.id,
                        kind = %sub.kind,
                        error = %error,
                        "Disconnect failed, dropping handle"
                    );
                    report.failures.push(DisconnectFailure {
                        id: sub.id,
                        kind: sub.kind,
                        error,
                    });
                }
            }
        }

        info!(
            disconnected = report.disconnected,
            failed = report.failures.len(),
            "Subscriptions cleared"
        );
        report
    }

    /// Kinds of the registered subscriptions, in registration order.
    #[must_use]
    pub fn kinds(&self) -> Vec<SubscriptionKind> {
        self.subscriptions.iter().map(|s| s.kind.clone()).collect()
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("kinds", &self.kinds())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::transport::MockChannel;

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut registry = SubscriptionRegistry::new();
        let (a, _) = MockChannel::new();
        let (b, _) = MockChannel::new();

        let first = registry.register(SubscriptionKind::OrderCreated, Box::new(a));
        let second = registry.register(
            SubscriptionKind::OrderChanged(OrderId::new("o1")),
            Box::new(b),
        );

        assert!(first < second);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.kinds(),
            vec![
                SubscriptionKind::OrderCreated,
                SubscriptionKind::OrderChanged(OrderId::new("o1"))
            ]
        );
    }

    #[test]
    fn test_clear_all_disconnects_everything() {
        let mut registry = SubscriptionRegistry::new();
        let probes: Vec<_> = (0..3)
            .map(|_| {
                let (channel, probe) = MockChannel::new();
                registry.register(SubscriptionKind::OrderCreated, Box::new(channel));
                probe
            })
            .collect();

        let report = registry.clear_all();

        assert!(report.is_clean());
        assert_eq!(report.disconnected, 3);
        assert!(registry.is_empty());
        assert!(probes.iter().all(|p| p.disconnect_calls() == 1));
    }

    #[test]
    fn test_clear_all_continues_past_failures() {
        let mut registry = SubscriptionRegistry::new();
        let mut probes = Vec::new();
        for i in 0..5 {
            let (channel, probe) = MockChannel::new();
            if i == 2 {
                probe.fail_disconnect("socket already gone");
            }
            registry.register(SubscriptionKind::OrderCreated, Box::new(channel));
            probes.push(probe);
        }

        let report = registry.clear_all();

        assert_eq!(report.total(), 5);
        assert_eq!(report.disconnected, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id.value(), 2);
        assert_eq!(
            report.failures[0].error,
            TransportError::Disconnect("socket already gone".into())
        );
        assert!(registry.is_empty());
        assert!(probes.iter().all(|p| p.disconnect_calls() == 1));
    }

    #[test]
    fn test_clear_all_on_empty_registry() {
        let mut registry = SubscriptionRegistry::new();
        let report = registry.clear_all();
        assert_eq!(report, TeardownReport::default());
    }

    #[test]
    fn test_subscription_ids_keep_increasing_after_clear() {
        let mut registry = SubscriptionRegistry::new();
        let (a, _) = MockChannel::new();
        let first = registry.register(SubscriptionKind::OrderCreated, Box::new(a));
        registry.clear_all();

        let (b, _) = MockChannel::new();
        let second = registry.register(SubscriptionKind::OrderCreated, Box::new(b));
        assert!(second > first);
    }
}
