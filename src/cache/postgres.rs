use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;

use super::{CacheError, TtlCache};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cache_entries (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL
    )
"#;

/// Cache over a shared table, consistent across service instances.
#[derive(Clone)]
pub struct PgTtlCache {
    pool: PgPool,
}

impl PgTtlCache {
    pub async fn new(pool: PgPool) -> Result<Self, CacheError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Deletes expired rows. Reads already ignore them.
    pub async fn purge_expired(&self) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TtlCache for PgTtlCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = $1 AND expires_at > now()")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(row) => Some(row.try_get("value")?),
            None => None,
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at) \
             VALUES ($1, $2, now() + make_interval(secs => $3)) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        // Expired rows restart the window in the same statement
        let row = sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at) \
             VALUES ($1, '1', now() + make_interval(secs => $2)) \
             ON CONFLICT (key) DO UPDATE SET \
                 value = CASE WHEN cache_entries.expires_at <= now() THEN '1' \
                              ELSE ((cache_entries.value)::bigint + 1)::text END, \
                 expires_at = CASE WHEN cache_entries.expires_at <= now() THEN EXCLUDED.expires_at \
                                   ELSE cache_entries.expires_at END \
             RETURNING value",
        )
        .bind(key)
        .bind(ttl.as_secs_f64())
        .fetch_one(&self.pool)
        .await?;

        let value: String = row.try_get("value")?;
        value.parse().map_err(|_| CacheError::NotACounter(key.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM cache_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
