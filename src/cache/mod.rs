//! Key/value cache with per-entry expiry.
//!
//! Backs the rate limiter and CSRF token table. The memory backend is
//! process-local; the Postgres backend shares state across instances.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryTtlCache;
pub use postgres::PgTtlCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache entry '{0}' is not a counter")]
    NotACounter(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait TtlCache: Send + Sync {
    /// Live value for `key`. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Fixed-window counter. The first increment of a missing or expired key
    /// starts a window of `ttl` and returns 1; later increments inside the
    /// window keep its expiry.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}
