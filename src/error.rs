use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error as ThisError;

use crate::projector::ProjectionError;

/// Failures between the pool and the datastore. Deliberately carries no
/// statement text and no parameter values.
#[derive(Debug, ThisError)]
pub enum DataAccessError {
    #[error("timed out waiting for a database connection")]
    AcquireTimeout,

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("could not open a database connection")]
    Connect,

    #[error("statement failed ({kind})")]
    Statement { kind: String },
}

/// Input rejected at the boundary, before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum InvalidInput {
    #[error("account and password are required")]
    MissingCredentials,

    #[error("account must be 5-15 letters, digits or underscores")]
    Account,

    #[error("password must be 6-15 letters or digits")]
    Password,

    #[error("old and new password are required")]
    MissingPasswords,

    #[error("new password must be 6-15 letters or digits")]
    NewPassword,
}

#[derive(Debug, ThisError)]
pub enum GatewayError {
    #[error("invalid input: {0}")]
    Validation(#[from] InvalidInput),

    #[error("not logged in")]
    Unauthenticated,

    #[error("account or password mismatch")]
    InvalidCredential,

    /// Old password mismatch on a password change, including a concurrent
    /// change that won the conditional update.
    #[error("old password mismatch")]
    InvalidOldPassword,

    #[error("data access failed: {0}")]
    DataAccess(#[from] DataAccessError),

    #[error("row shape mismatch: {0}")]
    Projection(#[from] ProjectionError),
}

/// Body shared by every portal response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl GatewayError {
    /// Status and fixed message shown to the client.
    pub fn public_parts(&self) -> (StatusCode, String) {
        match self {
            GatewayError::Validation(input) => (StatusCode::BAD_REQUEST, input.to_string()),
            GatewayError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Please log in first.".to_string())
            }
            GatewayError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "Incorrect account or password.".to_string(),
            ),
            GatewayError::InvalidOldPassword => (
                StatusCode::BAD_REQUEST,
                "Old password is incorrect.".to_string(),
            ),
            GatewayError::DataAccess(_) | GatewayError::Projection(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Service temporarily unavailable, please try again later.".to_string(),
            ),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        if let GatewayError::DataAccess(_) | GatewayError::Projection(_) = &self {
            tracing::error!("[portal] [internal_error] {}", self);
        }
        let (status, message) = self.public_parts();
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}
