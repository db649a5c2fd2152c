// File: src/error.rs
// Purpose: JSON error responses for handler failures

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use formflow::{AccountError, FormContext, PersistenceError};
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

impl ErrorResponse {
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

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });

        (self.status, body).into_response()
    }
}

impl From<PersistenceError> for ErrorResponse {
    fn from(err: PersistenceError) -> Self {
        error!(error = %err, "persistence failed");
        ErrorResponse::internal("could not store the submission")
    }
}

impl From<AccountError> for ErrorResponse {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials => ErrorResponse::unauthorized(err.to_string()),
            AccountError::InvalidResetToken => ErrorResponse::bad_request(err.to_string()),
            AccountError::InvalidTransition { .. } => ErrorResponse::bad_request(err.to_string()),
            AccountError::Persistence(err) => err.into(),
        }
    }
}

/// A failed form: 422 with errors and the submitted values
pub fn unprocessable(context: FormContext) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(context)).into_response()
}
