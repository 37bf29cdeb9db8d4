//! HTTP error shape shared by all route handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::common::AuthError;
use crate::domains::auth::AuthFlowError;

/// A handler error: a status code plus a client-safe message.
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

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<AuthFlowError> for ApiError {
    fn from(err: AuthFlowError) -> Self {
        match &err {
            AuthFlowError::InvalidCredentials
            | AuthFlowError::InvalidOrExpiredCode
            | AuthFlowError::InvalidSession => Self::unauthorized(err.to_string()),
            AuthFlowError::AccountSuspended => Self::forbidden(err.to_string()),
            AuthFlowError::UpstreamAuthFailure(_) => {
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            AuthFlowError::MalformedToken(_) | AuthFlowError::EmailUnavailable => {
                Self::bad_request(err.to_string())
            }
            AuthFlowError::Conflict(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            AuthFlowError::Database(e) => {
                error!("database error in auth flow: {}", e);
                Self::internal()
            }
            AuthFlowError::Internal(e) => {
                error!("internal error in auth flow: {}", e);
                Self::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationRequired => Self::unauthorized(err.to_string()),
            AuthError::PermissionDenied(_) => Self::forbidden(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("unhandled error: {}", err);
        Self::internal()
    }
}
