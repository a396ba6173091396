//! Persistence sink: the row store tool handlers commit artifacts into.
//!
//! The orchestrator never writes here. Handlers `put` or `update`; callers `get` after a
//! conversation completes, addressing rows by [`RowKey`].
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PersistenceSink`] | Trait for row stores |
//! | [`MemoryStore`] | In-process store with per-key atomic writes and TTL |
//! | [`RowKey`] / [`ArtifactKind`] | Key conventions (`<tenant>#<issue>`, `SOCIAL#<platform>`, `analytics`) |

mod key;
mod memory;

pub use key::{partition_key, ArtifactKind, RowKey, ANALYTICS_SORT_KEY, SOCIAL_SORT_PREFIX};
pub use memory::MemoryStore;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One stored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: RowKey,
    pub attributes: Map<String, Value>,
    /// Epoch seconds after which the row reads as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl Record {
    pub fn new(key: RowKey, attributes: Map<String, Value>) -> Self {
        Self {
            key,
            attributes,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).and_then(|v| v.as_str())
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.map(|t| t <= now).unwrap_or(false)
    }
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Write a whole row, replacing any existing row under the same key.
    async fn put(&self, record: Record) -> Result<()>;

    /// Merge attributes into a row, creating it if absent. Returns the row as written.
    async fn update(&self, key: &RowKey, attributes: Map<String, Value>) -> Result<Record>;

    async fn get(&self, key: &RowKey) -> Result<Option<Record>>;

    async fn delete(&self, key: &RowKey) -> Result<bool>;

    fn name(&self) -> &'static str;
}
