//! In-memory persistence sink.

use super::{now_epoch_secs, PersistenceSink, Record, RowKey};
use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Rows keyed by [`RowKey`]. Every write holds the map lock for its whole read-modify-write,
/// so writes are atomic per key.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<HashMap<RowKey, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RowKey, Record>> {
        self.rows.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RowKey, Record>> {
        self.rows.write().unwrap_or_else(|e| e.into_inner())
    }

    fn purge_expired(rows: &mut HashMap<RowKey, Record>, now: u64) {
        rows.retain(|_, r| !r.is_expired_at(now));
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        let now = now_epoch_secs();
        self.read().values().filter(|r| !r.is_expired_at(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live rows under one partition, sorted by sort key.
    pub fn partition(&self, partition: &str) -> Vec<Record> {
        let now = now_epoch_secs();
        let mut rows: Vec<Record> = self
            .read()
            .values()
            .filter(|r| r.key.partition == partition && !r.is_expired_at(now))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.key.sort.cmp(&b.key.sort));
        rows
    }
}

#[async_trait]
impl PersistenceSink for MemoryStore {
    async fn put(&self, record: Record) -> Result<()> {
        let mut rows = self.write();
        Self::purge_expired(&mut rows, now_epoch_secs());
        rows.insert(record.key.clone(), record);
        Ok(())
    }

    async fn update(&self, key: &RowKey, attributes: Map<String, Value>) -> Result<Record> {
        let mut rows = self.write();
        Self::purge_expired(&mut rows, now_epoch_secs());
        let record = rows
            .entry(key.clone())
            .or_insert_with(|| Record::new(key.clone(), Map::new()));
        for (name, value) in attributes {
            record.attributes.insert(name, value);
        }
        Ok(record.clone())
    }

    async fn get(&self, key: &RowKey) -> Result<Option<Record>> {
        let now = now_epoch_secs();
        Ok(self
            .read()
            .get(key)
            .filter(|r| !r.is_expired_at(now))
            .cloned())
    }

    async fn delete(&self, key: &RowKey) -> Result<bool> {
        Ok(self.write().remove(key).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = MemoryStore::new();
        let key = RowKey::new("t1#198", "SOCIAL#linkedin");
        store
            .put(Record::new(key.clone(), attrs(json!({"copy": "first"}))))
            .await
            .unwrap();
        store
            .put(Record::new(key.clone(), attrs(json!({"copy": "second"}))))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let row = store.get(&key).await.unwrap().unwrap();
        assert_eq!(row.get_str("copy"), Some("second"));
    }

    #[tokio::test]
    async fn test_update_merges_and_creates() {
        let store = MemoryStore::new();
        let key = RowKey::new("t1#198", "analytics");
        store
            .put(Record::new(key.clone(), attrs(json!({"opens": 120, "clicks": 9}))))
            .await
            .unwrap();
        let row = store
            .update(&key, attrs(json!({"clicks": 11, "insights": ["a"]})))
            .await
            .unwrap();
        assert_eq!(row.get("opens"), Some(&json!(120)));
        assert_eq!(row.get("clicks"), Some(&json!(11)));
        assert_eq!(row.get("insights"), Some(&json!(["a"])));

        let fresh = RowKey::new("t1#199", "analytics");
        let row = store.update(&fresh, attrs(json!({"x": 1}))).await.unwrap();
        assert_eq!(row.key, fresh);
    }

    #[tokio::test]
    async fn test_expired_rows_read_as_absent() {
        let store = MemoryStore::new();
        let key = RowKey::new("t1#198", "SOCIAL#x");
        store
            .put(Record::new(key.clone(), Map::new()).with_expiry(1))
            .await
            .unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_partition_listing_is_sorted_and_isolated() {
        let store = MemoryStore::new();
        for (p, s) in [("t1#1", "analytics"), ("t1#1", "SOCIAL#x"), ("t2#1", "analytics")] {
            store.put(Record::new(RowKey::new(p, s), Map::new())).await.unwrap();
        }
        let sorts: Vec<_> = store
            .partition("t1#1")
            .into_iter()
            .map(|r| r.key.sort)
            .collect();
        assert_eq!(sorts, vec!["SOCIAL#x", "analytics"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let key = RowKey::new("t1#1", "analytics");
        store.put(Record::new(key.clone(), Map::new())).await.unwrap();
        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
    }
}
