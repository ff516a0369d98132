//! SQLite-backed record store (persists across restarts).

use async_trait::async_trait;
use mem_types::{
    ContentType, MemoryListQuery, MemoryMetadata, MemoryRecord, MemoryStore, MemoryStoreError,
};
use std::path::Path;

/// SQLite-backed memory store for persistence.
pub struct SqliteMemoryStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteMemoryStore {
    /// Open (or create) a store at the given path. `":memory:"` gives a private in-memory database.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryStoreError> {
        let conn =
            rusqlite::Connection::open(path).map_err(|e| MemoryStoreError::Other(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                memory_id TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                persona_id TEXT NOT NULL,
                content TEXT NOT NULL,
                content_type TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_memories_user ON memories(user_id, persona_id);
            "#,
        )
        .map_err(|e| MemoryStoreError::Other(e.to_string()))?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, MemoryStoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MemoryStoreError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(|e| MemoryStoreError::Other(e.to_string()))
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> Result<MemoryRecord, rusqlite::Error> {
        let content_type: String = row.get(4)?;
        let metadata_json: String = row.get(5)?;
        let content_type = content_type.parse::<ContentType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?;
        let metadata: MemoryMetadata = serde_json::from_str(&metadata_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(MemoryRecord {
            memory_id: row.get(0)?,
            user_id: row.get(1)?,
            persona_id: row.get(2)?,
            content: row.get(3)?,
            content_type,
            metadata,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

const SELECT_COLUMNS: &str = "memory_id, user_id, persona_id, content, content_type, metadata, created_at, updated_at";

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn insert(&self, record: MemoryRecord) -> Result<(), MemoryStoreError> {
        let metadata_json = serde_json::to_string(&record.metadata)
            .map_err(|e| MemoryStoreError::Other(e.to_string()))?;
        let inserted = self.with_conn(|conn| {
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM memories WHERE memory_id = ?1",
                rusqlite::params![record.memory_id],
                |row| row.get(0),
            )?;
            if exists > 0 {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO memories (memory_id, user_id, persona_id, content, content_type, metadata, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    record.memory_id,
                    record.user_id,
                    record.persona_id,
                    record.content,
                    record.content_type.as_str(),
                    metadata_json,
                    record.created_at,
                    record.updated_at,
                ],
            )?;
            Ok(true)
        })?;
        if !inserted {
            return Err(MemoryStoreError::Duplicate(record.memory_id));
        }
        Ok(())
    }

    async fn get(&self, memory_id: &str) -> Result<Option<MemoryRecord>, MemoryStoreError> {
        let sql = format!("SELECT {} FROM memories WHERE memory_id = ?1", SELECT_COLUMNS);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params![memory_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(Self::row_to_record(row)?)),
                None => Ok(None),
            }
        })
    }

    async fn delete(&self, memory_id: &str) -> Result<bool, MemoryStoreError> {
        let n = self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM memories WHERE memory_id = ?1",
                rusqlite::params![memory_id],
            )
        })?;
        Ok(n > 0)
    }

    async fn list(
        &self,
        query: &MemoryListQuery,
    ) -> Result<(Vec<MemoryRecord>, usize), MemoryStoreError> {
        let persona = query.persona_id.clone();
        // SQLite reads a negative OFFSET as 0; saturate instead of wrapping.
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {} FROM memories WHERE user_id = ?1 AND (?2 IS NULL OR persona_id = ?2) ORDER BY seq LIMIT ?3 OFFSET ?4",
            SELECT_COLUMNS
        );
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM memories WHERE user_id = ?1 AND (?2 IS NULL OR persona_id = ?2)",
                rusqlite::params![query.user_id, persona],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params![query.user_id, persona, limit, offset],
                Self::row_to_record,
            )?;
            let page = rows.collect::<Result<Vec<_>, _>>()?;
            Ok((page, total as usize))
        })
    }

    async fn count(&self) -> Result<usize, MemoryStoreError> {
        let n: i64 = self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
        })?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, user: &str, persona: &str) -> MemoryRecord {
        let mut metadata = MemoryMetadata {
            tags: vec!["t".to_string()],
            importance: Some(3),
            topic: Some("topic".to_string()),
            ..Default::default()
        };
        metadata
            .extra
            .insert("source".to_string(), serde_json::json!("chat"));
        MemoryRecord {
            memory_id: id.to_string(),
            user_id: user.to_string(),
            persona_id: persona.to_string(),
            content: format!("content of {}", id),
            content_type: ContentType::Markdown,
            metadata,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            updated_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn roundtrip_and_delete() {
        let store = SqliteMemoryStore::new(":memory:").unwrap();
        let rec = record("m1", "u1", "p1");
        store.insert(rec.clone()).await.unwrap();
        assert_eq!(store.get("m1").await.unwrap(), Some(rec));
        assert!(matches!(
            store.insert(record("m1", "u1", "p1")).await,
            Err(MemoryStoreError::Duplicate(_))
        ));
        assert!(store.delete("m1").await.unwrap());
        assert!(store.get("m1").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_respects_filters_and_paging() {
        let store = SqliteMemoryStore::new(":memory:").unwrap();
        for (id, user, persona) in [("a", "u1", "p1"), ("b", "u1", "p2"), ("c", "u1", "p1")] {
            store.insert(record(id, user, persona)).await.unwrap();
        }
        let q = MemoryListQuery {
            user_id: "u1".to_string(),
            persona_id: Some("p1".to_string()),
            limit: 1,
            offset: 1,
        };
        let (page, total) = store.list(&q).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].memory_id, "c");
    }

    #[tokio::test]
    async fn offset_past_i64_range_gives_empty_page() {
        let sqlite = SqliteMemoryStore::new(":memory:").unwrap();
        let in_memory = crate::InMemoryMemoryStore::new();
        for id in ["a", "b"] {
            sqlite.insert(record(id, "u1", "p1")).await.unwrap();
            in_memory.insert(record(id, "u1", "p1")).await.unwrap();
        }
        let q = MemoryListQuery {
            user_id: "u1".to_string(),
            persona_id: None,
            limit: usize::MAX,
            offset: usize::MAX,
        };
        let (page, total) = sqlite.list(&q).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 2);
        assert_eq!(in_memory.list(&q).await.unwrap().0.len(), page.len());

        let q = MemoryListQuery { offset: 0, ..q };
        assert_eq!(sqlite.list(&q).await.unwrap().0.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_inserts_report_duplicate() {
        let store = std::sync::Arc::new(SqliteMemoryStore::new(":memory:").unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.insert(record("same", "u1", "p1")).await })
            })
            .collect();
        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(()) => ok += 1,
                Err(MemoryStoreError::Duplicate(id)) => assert_eq!(id, "same"),
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
