//! User signup, login, logout and listing.

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use super::{created, required, success, ApiResult};
use crate::auth::{self, AuthUser};
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, MessageResponse, SignupRequest, User, UserSummary};
use crate::AppState;

const DEFAULT_ROLE: &str = "user";

/// Run a CPU-heavy closure on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Worker task failed: {}", e)))
}

/// POST /api/users/register - Create an account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<MessageResponse> {
    let name = required(Some(request.name.as_str()), "Name")?.to_string();
    let email = required(Some(request.email.as_str()), "Email")?.to_lowercase();
    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    let role = request
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_ROLE)
        .to_string();

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let password = request.password;
    let hash = blocking(move || auth::hash_password(&password)).await??;

    // The unique index still guards against a concurrent signup.
    let user = state.repo.create_user(&name, &email, &hash, &role).await?;
    tracing::info!("Registered user {} ({})", user.id, user.role);

    created(MessageResponse::new("Signup successful"))
}

/// POST /api/users/login - Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let invalid = || AppError::Validation("Invalid credentials".to_string());

    let email = request.email.trim().to_lowercase();
    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        return Err(invalid());
    };

    let password = request.password;
    let hash = user.password_hash.clone();
    let matches = blocking(move || auth::verify_password(&password, &hash)).await?;
    if !matches {
        return Err(invalid());
    }

    let token = state.tokens.issue(&user.id)?;

    success(LoginResponse {
        token,
        user: UserSummary::from(&user),
    })
}

/// POST /api/users/logout - Revoke the presented token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<MessageResponse> {
    state
        .repo
        .revoke_token(&auth_user.token_id, auth_user.expires_at)
        .await?;

    match state
        .repo
        .purge_expired_revocations(Utc::now().timestamp())
        .await
    {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Purged {} expired token revocations", n),
        Err(e) => tracing::warn!("Failed to purge expired revocations: {}", e),
    }

    tracing::info!("User {} logged out", auth_user.user_id);
    success(MessageResponse::new("Logout successful"))
}

/// GET /api/users - List users (password hashes are never serialized).
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    success(state.repo.list_users().await?)
}
