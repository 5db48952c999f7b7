//! Router assembly: tiered routes, gates and global layers.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{csrf_guard, rate_limit, require_admin, require_authenticated, require_identity, security_headers};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .merge(public_routes())
        .merge(identity_routes(state.clone()))
        .merge(protected_routes(state.clone()))
        .merge(elevated_routes(state.clone()));

    if config.security.enable_csrf {
        router = router.layer(from_fn_with_state(state.clone(), csrf_guard));
    }
    if config.api.enable_rate_limiting {
        router = router.layer(from_fn_with_state(state.clone(), rate_limit));
    }
    if let Some(cors) = cors_layer(&config.security) {
        router = router.layer(cors);
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(security_headers))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/csrf", post(public::csrf_issue))
        .route("/api/events", get(public::events_list))
        .route("/api/events/:id", get(public::event_get))
}

fn identity_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(protected::register))
        .route_layer(from_fn_with_state(state, require_identity))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(protected::whoami))
        .route("/api/users", get(protected::users_list))
        .route("/api/users/:id", get(protected::user_get).patch(protected::user_update))
        .route("/api/users/:id/badges", get(protected::user_badges))
        .route("/api/users/:id/messages", get(protected::user_messages))
        .route("/api/events/:id/checkin", post(protected::event_checkin))
        .route_layer(from_fn_with_state(state, require_authenticated))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users", post(elevated::user_create))
        .route("/api/users/:id", delete(elevated::user_delete))
        .route("/api/admin/users/:id/approve", patch(elevated::user_approve))
        .route("/api/admin/analytics", get(elevated::analytics_get))
        .route("/api/events", post(elevated::event_create))
        .route_layer(from_fn_with_state(state, require_admin))
}
