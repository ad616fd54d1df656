//! Error handling module
//!
//! Every authentication and authorization failure resolves to exactly one
//! `AppError` kind, rendered as a `(kind, status, message)` triple.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Token expired: {0}")]
    TokenExpired(String),

    #[error("Not approved: {0}")]
    NotApproved(String),

    #[error("Membership expired: {0}")]
    MembershipExpired(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
}

impl AppError {
    /// Stable error kind name reported to clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotAuthorized(_) => "NotAuthorizedError",
            AppError::TokenExpired(_) => "TokenExpiredError",
            AppError::NotApproved(_) => "NotApprovedError",
            AppError::MembershipExpired(_) => "MembershipExpiredError",
            AppError::BadRequest(_) => "BadRequestError",
            AppError::Validation(_) => "ValidationError",
            AppError::Forbidden(_) => "ForbiddenError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::Conflict(_) => "ConflictError",
            AppError::Internal(_) | AppError::Database(_) | AppError::Pool(_) => {
                "InternalAuthError"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotAuthorized(_)
            | AppError::TokenExpired(_)
            | AppError::NotApproved(_)
            | AppError::MembershipExpired(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) | AppError::Pool(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Internal faults never expose their cause.
    pub fn message(&self) -> String {
        match self {
            AppError::NotAuthorized(msg)
            | AppError::TokenExpired(msg)
            | AppError::NotApproved(msg)
            | AppError::MembershipExpired(msg)
            | AppError::BadRequest(msg)
            | AppError::Validation(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Internal(_) | AppError::Database(_) | AppError::Pool(_) => {
                "Server error during authentication".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => error!("Database error: {:?}", e),
            AppError::Pool(e) => error!("Pool error: {:?}", e),
            AppError::Internal(msg) => error!("Internal error: {}", msg),
            _ => {}
        }

        let body = Json(ErrorResponse {
            success: false,
            message: self.message(),
            code: self.kind(),
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let cases = [
            (AppError::NotAuthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::TokenExpired("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::NotApproved("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::MembershipExpired("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status, "{}", err.kind());
        }
    }

    #[test]
    fn test_internal_message_is_opaque() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.kind(), "InternalAuthError");
        assert!(!err.message().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::Forbidden("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "ForbiddenError");
        assert_eq!(body["message"], "nope");
    }
}
