/*!
 * Error Handling
 * Maps handler failures to HTTP status codes and a JSON error body
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calc::CalcError;
use crate::mail::MailError;

/// Error body shared by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found() -> Self {
        AppError::NotFound("Not found".to_string())
    }

    pub fn database_unavailable() -> Self {
        AppError::ServiceUnavailable("Database not available".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CalcError> for AppError {
    fn from(err: CalcError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details go to the log, never to the client.
        let (error, message) = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ("Database error".to_string(), None)
            }
            AppError::Mail(e) => {
                tracing::error!(error = %e, "mail delivery failed");
                (
                    "Failed to send message".to_string(),
                    Some("Please try again later or email us directly.".to_string()),
                )
            }
            other => (other.to_string(), None),
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, ErrorResponse) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_maps_to_bad_request() {
        let (status, body) = body_of(AppError::validation("Title is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Title is required");
    }

    #[tokio::test]
    async fn test_database_error_is_generic() {
        let (status, body) = body_of(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Database error");
    }

    #[tokio::test]
    async fn test_unavailable_maps_to_503() {
        let (status, body) = body_of(AppError::database_unavailable()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "Database not available");
    }

    #[test]
    fn test_calc_error_becomes_validation() {
        let err: AppError = CalcError::Negative { field: "amount" }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "amount cannot be negative");
    }
}
