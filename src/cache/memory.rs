use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{CacheError, TtlCache};

const SWEEP_EVERY: u64 = 128;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-local cache. Entries expire lazily on read; every
/// `SWEEP_EVERY` writes the whole table is swept.
#[derive(Default)]
pub struct MemoryTtlCache {
    entries: Mutex<HashMap<String, Entry>>,
    writes: AtomicU64,
}

impl MemoryTtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn should_sweep(&self) -> bool {
        self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl TtlCache for MemoryTtlCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let sweep = self.should_sweep();
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if sweep {
            entries.retain(|_, entry| entry.is_live(now));
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        let sweep = self.should_sweep();
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if sweep {
            entries.retain(|_, entry| entry.is_live(now));
        }

        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                let count: u64 = entry
                    .value
                    .parse()
                    .map_err(|_| CacheError::NotACounter(key.to_string()))?;
                let count = count + 1;
                entry.value = count.to_string();
                Ok(count)
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
