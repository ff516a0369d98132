//! In-memory record store (process lifetime only).

use async_trait::async_trait;
use mem_types::{MemoryListQuery, MemoryRecord, MemoryStore, MemoryStoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of MemoryStore.
/// Records are keyed by id; a per-user index keeps creation order for listing.
pub struct InMemoryMemoryStore {
    /// memory_id -> record.
    records: Arc<RwLock<HashMap<String, MemoryRecord>>>,
    /// user_id -> memory_ids, oldest first.
    user_index: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            user_index: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn insert(&self, record: MemoryRecord) -> Result<(), MemoryStoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.memory_id) {
            return Err(MemoryStoreError::Duplicate(record.memory_id));
        }
        let mut idx = self.user_index.write().await;
        idx.entry(record.user_id.clone())
            .or_default()
            .push(record.memory_id.clone());
        records.insert(record.memory_id.clone(), record);
        Ok(())
    }

    async fn get(&self, memory_id: &str) -> Result<Option<MemoryRecord>, MemoryStoreError> {
        Ok(self.records.read().await.get(memory_id).cloned())
    }

    async fn delete(&self, memory_id: &str) -> Result<bool, MemoryStoreError> {
        let mut records = self.records.write().await;
        let Some(record) = records.remove(memory_id) else {
            return Ok(false);
        };
        let mut idx = self.user_index.write().await;
        if let Some(ids) = idx.get_mut(&record.user_id) {
            ids.retain(|id| id != memory_id);
            if ids.is_empty() {
                idx.remove(&record.user_id);
            }
        }
        Ok(true)
    }

    async fn list(
        &self,
        query: &MemoryListQuery,
    ) -> Result<(Vec<MemoryRecord>, usize), MemoryStoreError> {
        let records = self.records.read().await;
        let idx = self.user_index.read().await;
        let matching: Vec<&MemoryRecord> = idx
            .get(&query.user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| records.get(id))
                    .filter(|r| match query.persona_id {
                        Some(ref p) => &r.persona_id == p,
                        None => true,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn count(&self) -> Result<usize, MemoryStoreError> {
        Ok(self.records.read().await.len())
    }
}
