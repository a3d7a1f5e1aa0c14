//! Auth route handlers: registration, login, current account.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name. Falls back to the email's local part.
    pub name: Option<String>,
    /// Email address, unique per account.
    pub email: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for register and login: a bearer token plus the account.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Response for the current-account endpoint.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

/// Register a new customer account.
///
/// # Errors
///
/// Returns 400 for a malformed email or weak password, 409 if the email is
/// already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let service = AuthService::new(state.pool(), state.config());
    let (user, token) = service
        .register(body.name.as_deref(), &body.email, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, "Account registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Login with email and password.
///
/// # Errors
///
/// Returns 401 if the email is unknown or the password is wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let service = AuthService::new(state.pool(), state.config());
    let (user, token) = service.login(&body.email, &body.password).await?;

    Ok(Json(AuthResponse { token, user }))
}

/// Return the account behind the presented token.
///
/// # Errors
///
/// Returns 401 if the token is valid but the account no longer exists.
pub async fn me(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>> {
    let service = AuthService::new(state.pool(), state.config());
    let user = service.current_user(identity).await?;

    Ok(Json(MeResponse { user }))
}
