//! Authentication module.
//!
//! Argon2 password hashes, HS256 bearer tokens and a revocation-aware
//! middleware guarding the protected routes.

use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::AppState;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Token id, the unit of revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identity attached to requests that passed the bearer middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub token_id: String,
    pub expires_at: i64,
}

/// Signing and verification keys for access tokens.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Issue a fresh token for a user.
    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| AppError::Internal("Token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry. Revocation is checked separately.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

/// Hash a password with a random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored hash. Unparseable hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Bearer authentication layer: verifies the token, rejects revoked ones and
/// attaches an [`AuthUser`] to the request.
pub async fn bearer_auth_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return AppError::Unauthorized("Access denied. No token provided".to_string())
            .into_response();
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    match state.repo.is_token_revoked(&claims.jti).await {
        Ok(false) => {}
        Ok(true) => {
            return AppError::Unauthorized("Token has been revoked".to_string()).into_response()
        }
        Err(e) => return e.into_response(),
    }

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        token_id: claims.jti,
        expires_at: claims.exp,
    });

    next.run(request).await
}
