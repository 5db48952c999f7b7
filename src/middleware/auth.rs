use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::{bearer_token, AuthError, Claims};
use crate::database::models::{collections, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::state::AppState;

/// Verified token plus the user record it resolves to.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub claims: Claims,
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Self-or-admin check for per-user resources.
    pub fn can_access(&self, user_id: &str) -> bool {
        self.is_admin() || self.user.id == user_id
    }
}

/// Verified token without a user record. Set by `require_identity`.
#[derive(Clone, Debug)]
pub struct AuthIdentity(pub Claims);

/// Verifies the bearer token only.
pub fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = bearer_token(header).map_err(|_| ApiError::unauthorized("Missing or invalid authorization header"))?;
    state.verifier.verify(token).map_err(|err| match err {
        AuthError::InvalidSecret => ApiError::from(err),
        other => {
            debug!("Rejected bearer token: {}", other);
            ApiError::unauthorized("Invalid token")
        }
    })
}

/// Token plus user record; pending students are refused.
pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let claims = resolve_identity(state, headers)?;
    let users = Repository::<User>::new(collections::USERS, state.store.clone());
    let user = users
        .select_one(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.is_pending_approval() {
        return Err(ApiError::forbidden("Account pending approval"));
    }
    Ok(AuthUser { claims, user })
}

pub async fn resolve_admin(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let auth = resolve_user(state, headers).await?;
    if !auth.is_admin() {
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(auth)
}

pub async fn require_identity(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = resolve_identity(&state, request.headers())?;
    request.extensions_mut().insert(AuthIdentity(claims));
    Ok(next.run(request).await)
}

pub async fn require_authenticated(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = resolve_user(&state, request.headers()).await?;
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

pub async fn require_admin(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth = resolve_admin(&state, request.headers()).await?;
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}
