//! Sync session configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// What the order service loads and subscribes to on bootstrap, and how the
/// store publishes changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Tenant whose orders are loaded into the collection. No list fetch
    /// runs when unset.
    pub tenant_id: Option<String>,

    /// Status filter for the bootstrap list fetch.
    pub status: String,

    /// Request the full field set (items and products) for the list fetch.
    pub full: bool,

    /// Open the `orderCreated` channel on bootstrap.
    pub subscribe_created: bool,

    /// Open an `orderChanged` channel for every order loaded on bootstrap.
    pub watch_collection: bool,

    /// Buffer size of the store change feed.
    pub notify_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            status: "pending".into(),
            full: false,
            subscribe_created: false,
            watch_collection: false,
            notify_capacity: 64,
        }
    }
}

impl SyncConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tenant) = &self.tenant_id {
            if tenant.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "tenant_id",
                    reason: "must not be empty when set".to_string(),
                });
            }
        }
        if self.status.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "status" });
        }
        if self.notify_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "notify_capacity",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
