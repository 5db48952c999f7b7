use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cache::{CacheError, TtlCache};

/// Per-session CSRF tokens held in the shared cache.
#[derive(Clone)]
pub struct CsrfProtection {
    cache: Arc<dyn TtlCache>,
    ttl: Duration,
}

fn cache_key(session_id: &str) -> String {
    format!("csrf:{}", session_id)
}

impl CsrfProtection {
    pub fn new(cache: Arc<dyn TtlCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Issues a 64-character hex token, replacing any previous one.
    pub async fn generate(&self, session_id: &str) -> Result<String, CacheError> {
        let mut hasher = Sha256::new();
        hasher.update(Uuid::new_v4().as_bytes());
        hasher.update(Uuid::new_v4().as_bytes());
        hasher.update(session_id.as_bytes());
        let token = format!("{:x}", hasher.finalize());

        self.cache.set(&cache_key(session_id), &token, self.ttl).await?;
        Ok(token)
    }

    pub async fn verify(&self, session_id: &str, token: &str) -> Result<bool, CacheError> {
        let key = cache_key(session_id);
        match self.cache.get(&key).await? {
            Some(stored) => Ok(stored == token),
            None => {
                self.cache.remove(&key).await?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTtlCache;

    #[tokio::test]
    async fn tokens_verify_per_session() {
        let csrf = CsrfProtection::new(Arc::new(MemoryTtlCache::new()), Duration::from_secs(60));
        let token = csrf.generate("session-a").await.unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        assert!(csrf.verify("session-a", &token).await.unwrap());
        assert!(!csrf.verify("session-b", &token).await.unwrap());
        assert!(!csrf.verify("session-a", "forged").await.unwrap());
    }

    #[tokio::test]
    async fn expired_tokens_fail() {
        let csrf = CsrfProtection::new(Arc::new(MemoryTtlCache::new()), Duration::from_millis(10));
        let token = csrf.generate("s").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!csrf.verify("s", &token).await.unwrap());
    }

    #[tokio::test]
    async fn regenerating_replaces_the_token() {
        let csrf = CsrfProtection::new(Arc::new(MemoryTtlCache::new()), Duration::from_secs(60));
        let first = csrf.generate("s").await.unwrap();
        let second = csrf.generate("s").await.unwrap();
        assert_ne!(first, second);
        assert!(!csrf.verify("s", &first).await.unwrap());
        assert!(csrf.verify("s", &second).await.unwrap());
    }
}
