use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenVerifier;
use crate::cache::{MemoryTtlCache, TtlCache};
use crate::config::AppConfig;
use crate::database::{DocumentStore, MemoryStore};
use crate::services::{CsrfProtection, PaginationEngine, RateLimiter, WindowConfig};

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub cache: Arc<dyn TtlCache>,
    pub verifier: TokenVerifier,
    pub pagination: PaginationEngine,
    pub rate_limiter: RateLimiter,
    pub csrf: CsrfProtection,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, cache: Arc<dyn TtlCache>) -> Self {
        let verifier = TokenVerifier::from_config(&config.security);
        let pagination = PaginationEngine::new(store.clone(), WindowConfig::from_config(&config.pagination))
            .with_debug_logging(config.pagination.debug_logging);
        let rate_limiter = RateLimiter::from_config(cache.clone(), &config.api);
        let csrf = CsrfProtection::new(cache.clone(), Duration::from_secs(config.security.csrf_token_ttl_secs));

        Self {
            config: Arc::new(config),
            store,
            cache,
            verifier,
            pagination,
            rate_limiter,
            csrf,
        }
    }

    /// Memory store and memory cache. Used by tests and `--store memory`.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), Arc::new(MemoryTtlCache::new()))
    }
}
