//! Authentication extractors.
//!
//! Provides extractors for requiring a verified bearer token in route
//! handlers. The token is stateless: extraction verifies the signature and
//! expiry against the configured secret, with no database round trip.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::services::auth::{UserIdentity, verify_token};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(identity): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
pub struct RequireAuth(pub UserIdentity);

/// Extractor that requires a valid bearer token carrying the admin role.
pub struct RequireAdmin(pub UserIdentity);

/// Error returned when authentication is required but missing or invalid.
pub enum AuthRejection {
    /// No usable `Authorization: Bearer` header.
    MissingToken,
    /// Token failed verification.
    InvalidToken,
    /// Token is valid but the account is not an admin.
    NotAdmin,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            Self::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Pull the bearer token out of the `Authorization` header and verify it.
fn authenticate(parts: &Parts, state: &AppState) -> Result<UserIdentity, AuthRejection> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthRejection::MissingToken)?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::MissingToken)?;

    verify_token(&state.config().jwt_secret, token).map_err(|_| AuthRejection::InvalidToken)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = authenticate(parts, state)?;
        if !identity.role.is_admin() {
            return Err(AuthRejection::NotAdmin);
        }
        Ok(Self(identity))
    }
}
