//! Storage trait for memory records.

use crate::{MemoryListQuery, MemoryRecord};
use async_trait::async_trait;

/// Record store abstraction. Ids are globally unique.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert a new record. Fails if the id already exists.
    async fn insert(&self, record: MemoryRecord) -> Result<(), MemoryStoreError>;

    /// Get one record by id.
    async fn get(&self, memory_id: &str) -> Result<Option<MemoryRecord>, MemoryStoreError>;

    /// Remove a record. Returns false when the id was unknown.
    async fn delete(&self, memory_id: &str) -> Result<bool, MemoryStoreError>;

    /// List a user's records in creation order; returns the page and the unpaged total.
    async fn list(
        &self,
        query: &MemoryListQuery,
    ) -> Result<(Vec<MemoryRecord>, usize), MemoryStoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, MemoryStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("memory already exists: {0}")]
    Duplicate(String),
    #[error("memory store error: {0}")]
    Other(String),
}
