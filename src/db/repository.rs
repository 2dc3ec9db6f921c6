use sqlx::{Pool, Sqlite};
use anyhow::Result;
use crate::db::queries;

/// Single-table key-value storage the card collection is saved into
#[async_trait::async_trait]
pub trait KvRepository: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// SQLite implementation of KvRepository
pub struct SqliteKvRepository {
    pool: Pool<Sqlite>,
}

impl SqliteKvRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl KvRepository for SqliteKvRepository {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let entry = queries::get_entry(&self.pool, key).await?;
        Ok(entry.map(|e| e.value))
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        queries::put_value(&self.pool, key, value).await
    }
}

#[cfg(test)]
pub use in_memory::InMemoryKvRepository;
