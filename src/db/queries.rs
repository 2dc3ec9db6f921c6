use sqlx::{Pool, Sqlite};
use anyhow::Result;
use crate::db::models::KvEntry;

pub async fn get_entry(pool: &Pool<Sqlite>, key: &str) -> Result<Option<KvEntry>> {
    let entry = sqlx::query_as::<_, KvEntry>(
        "SELECT key, value, updated_at FROM kv_store WHERE key = ?"
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

pub async fn put_value(pool: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    // SQLite datetime in UTC format
    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    sqlx::query(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"
    )
    .bind(key)
    .bind(value)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
