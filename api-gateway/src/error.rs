//! Error handling for the API gateway

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Common(#[from] Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// HTTP status, stable error code and optional details
    fn classify(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                Error::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found", None),
                Error::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount", None),
                Error::InsufficientFunds(_) => (StatusCode::BAD_REQUEST, "insufficient_funds", None),
                Error::AccountExists(_) => (StatusCode::CONFLICT, "account_exists", None),
                Error::Conflict(_) => (StatusCode::CONFLICT, "conflict", None),
                Error::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found", None),
                Error::DuplicateEmail(_) => (StatusCode::BAD_REQUEST, "email_taken", None),
                Error::InvalidCredentials(_) => (StatusCode::UNAUTHORIZED, "invalid_credentials", None),
                Error::AuthenticationError(_) => (StatusCode::UNAUTHORIZED, "unauthorized", None),
                Error::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error", None),

                // Server errors (5xx)
                Error::ConfigurationError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", None)
                }
                Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
                Error::Database(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    Some(serde_json::json!({
                        "code": e.as_database_error().and_then(|dbe| dbe.code().map(|c| c.to_string())),
                    })),
                ),
                Error::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error", None),
                Error::Serialization(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", None)
                }
            },
        }
    }

    /// Message safe to show the client; server faults are not described
    fn public_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();
        let (status, code, details) = self.classify();

        if status.is_server_error() {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
        } else {
            tracing::warn!("API Error [{}] {}: {}", request_id, code, &self);
        }

        let error_response = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message: self.public_message(status),
                details,
            },
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}
