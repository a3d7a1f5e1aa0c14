//! Unified error handling.
//!
//! All route handlers return `Result<T, AppError>`. The `IntoResponse` impl
//! maps each error class onto the HTTP taxonomy (validation 400, auth 401/403,
//! missing 404, conflict 409, everything else 500) and emits a JSON body of
//! the form `{"message": ...}`. Internal details are logged, never exposed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                OrderError::UserNotFound
                | OrderError::OrderNotFound
                | OrderError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                OrderError::NotOwner => StatusCode::FORBIDDEN,
                OrderError::InsufficientStock { .. }
                | OrderError::InvalidTransition { .. }
                | OrderError::NotCancellable(_) => StatusCode::CONFLICT,
                OrderError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Server-side failures collapse to a generic
    /// string; user-correctable failures keep their detail (including the
    /// offending product and shortfall on stock conflicts).
    fn message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_owned(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_owned(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_owned(),
                AuthError::InvalidToken => "Invalid or expired token".to_owned(),
                AuthError::UserAlreadyExists => "Email already registered".to_owned(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                _ => "Internal server error".to_owned(),
            },
            Self::Order(err) => match err {
                OrderError::Repository(RepositoryError::NotFound) => "Not found".to_owned(),
                OrderError::Repository(_) => "Internal server error".to_owned(),
                other => other.to_string(),
            },
            Self::Internal(_) => "Internal server error".to_owned(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(msg) | Self::Forbidden(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    use protech_core::OrderStatus;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_basic_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("order".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("no token".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("admin only".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("bad".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stock_conflict_maps_to_409() {
        let err = AppError::Order(OrderError::InsufficientStock {
            product: "iPhone 16 Pro 128GB".to_owned(),
            available: 2,
        });
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_stock_conflict_names_product_and_shortfall() {
        let err = AppError::Order(OrderError::InsufficientStock {
            product: "iPhone 16 Pro 128GB".to_owned(),
            available: 2,
        });
        let msg = err.message();
        assert!(msg.contains("iPhone 16 Pro 128GB"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_invalid_transition_maps_to_409() {
        let err = AppError::Order(OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Processing,
        });
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_foreign_order_maps_to_403() {
        assert_eq!(
            get_status(AppError::Order(OrderError::NotOwner)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = AppError::Internal("connection pool exhausted".to_owned());
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = AppError::Database(RepositoryError::NotFound);
        assert_eq!(get_status(err), StatusCode::NOT_FOUND);
    }
}
