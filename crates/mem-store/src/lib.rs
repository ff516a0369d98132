//! Memory record stores.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use mem_types::{MemoryListQuery, MemoryRecord, MemoryStore, MemoryStoreError};
pub use memory::InMemoryMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteMemoryStore;
