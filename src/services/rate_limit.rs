use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheError, TtlCache};
use crate::config::ApiConfig;

/// Outcome of one counted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub count: u64,
    pub limit: u64,
}

/// Fixed-window request counter per client key.
#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<dyn TtlCache>,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn TtlCache>, max_requests: u64, window: Duration) -> Self {
        Self {
            cache,
            max_requests,
            window,
        }
    }

    pub fn from_config(cache: Arc<dyn TtlCache>, api: &ApiConfig) -> Self {
        Self::new(cache, api.rate_limit_requests, Duration::from_secs(api.rate_limit_window_secs))
    }

    pub async fn check(&self, client: &str) -> Result<RateLimitDecision, CacheError> {
        let count = self.cache.increment(&format!("ratelimit:{}", client), self.window).await?;
        Ok(RateLimitDecision {
            allowed: count <= self.max_requests,
            count,
            limit: self.max_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTtlCache;

    #[tokio::test]
    async fn blocks_after_limit_per_client() {
        let limiter = RateLimiter::new(Arc::new(MemoryTtlCache::new()), 2, Duration::from_secs(60));
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);

        let third = limiter.check("10.0.0.1").await.unwrap();
        assert!(!third.allowed);
        assert_eq!(third.count, 3);

        assert!(limiter.check("10.0.0.2").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn window_resets() {
        let limiter = RateLimiter::new(Arc::new(MemoryTtlCache::new()), 1, Duration::from_millis(20));
        assert!(limiter.check("ip").await.unwrap().allowed);
        assert!(!limiter.check("ip").await.unwrap().allowed);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.check("ip").await.unwrap().allowed);
    }
}
