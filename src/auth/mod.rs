use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Bearer token claims issued by the identity provider.
///
/// `sub` is the identity provider's user id and doubles as the user
/// document id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, email: Option<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();
        Self {
            sub: sub.into(),
            email,
            name: None,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Authorization header must use Bearer token format")]
    MalformedCredential,

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// HS256 signer/verifier over the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
    expiry_hours: u64,
}

impl TokenVerifier {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    pub fn expiry_hours(&self) -> u64 {
        self.expiry_hours
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        Ok(self.secret.as_bytes())
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        let key = EncodingKey::from_secret(self.secret()?);
        Ok(encode(&Header::default(), claims, &key)?)
    }

    /// Convenience for tooling and tests: signs a token for `sub`.
    pub fn issue_for(&self, sub: &str, email: Option<&str>) -> Result<String, AuthError> {
        let claims = Claims::new(sub, email.map(str::to_string), self.expiry_hours);
        self.issue(&claims)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let key = DecodingKey::from_secret(self.secret()?);
        let data = decode::<Claims>(token, &key, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedCredential),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let verifier = TokenVerifier::new("test-secret", 1);
        let token = verifier.issue_for("user-1", Some("a@example.edu")).unwrap();
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("a@example.edu"));
    }

    #[test]
    fn rejects_foreign_signatures() {
        let ours = TokenVerifier::new("ours", 1);
        let theirs = TokenVerifier::new("theirs", 1);
        let token = theirs.issue_for("user-1", None).unwrap();
        assert!(matches!(ours.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let verifier = TokenVerifier::new("", 1);
        assert!(matches!(verifier.issue_for("x", None), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(matches!(bearer_token(None), Err(AuthError::MissingCredential)));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(AuthError::MalformedCredential)));
        assert!(matches!(bearer_token(Some("Bearer   ")), Err(AuthError::MalformedCredential)));
    }
}
