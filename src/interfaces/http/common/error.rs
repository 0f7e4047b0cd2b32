//! Error responses
//!
//! Every failure leaves the API as `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::application::LoginError;
use crate::domain::DomainError;

/// Error body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Status + message pair rendered as an `ErrorBody`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound {
                entity,
                field,
                value,
            } => Self::new(
                StatusCode::NOT_FOUND,
                format!("{} not found with {}: {}", entity, field, value),
            ),
            DomainError::Validation(msg) => Self::bad_request(msg),
            DomainError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            DomainError::Database(msg) => {
                error!("Database error: {}", msg);
                Self::internal()
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        let status = match &e {
            LoginError::UserNotFound => StatusCode::NOT_FOUND,
            LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            LoginError::RoleNotPermitted => StatusCode::FORBIDDEN,
            LoginError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LoginError::Store(_) => {
                error!("Login failed: {}", e);
                return Self::internal();
            }
        };
        Self::new(status, e.to_string())
    }
}
