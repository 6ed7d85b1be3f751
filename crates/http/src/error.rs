//! Error handling for the bookshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    /// Single-record lookup found nothing; rendered as 404 `{"message": ..}`
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any storage or parameter-coercion failure; rendered as 500 `{"error": ..}`
    #[error(transparent)]
    OperationFailed(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an operation failure from any displayable cause
    pub fn operation_failed(message: impl std::fmt::Display) -> Self {
        Self::OperationFailed(anyhow::anyhow!("{}", message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ApiResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        let body = match self {
            AppError::NotFound { message } => {
                tracing::warn!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    %message,
                    "Request error"
                );
                json!({ "message": message })
            }
            AppError::OperationFailed(e) => {
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    error = ?e,
                    "Request error"
                );
                json!({ "error": e.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}
