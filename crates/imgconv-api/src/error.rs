//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`; every error renders as
//! `{ "error": <client message> }` with the status from `ErrorMetadata`.
//! Details of internal errors are logged and never sent to the client.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imgconv_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;

pub const INVALID_MULTIPART_MESSAGE: &str = "Invalid multipart body";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: both the trait and `AppError` are foreign to this crate)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

/// Missing or malformed multipart content type
impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "Multipart extraction rejected");
        HttpAppError(AppError::InvalidInput(INVALID_MULTIPART_MESSAGE.to_string()))
    }
}

/// Errors while streaming the multipart body. Body limit overruns keep their 413.
impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return HttpAppError(AppError::PayloadTooLarge(
                "Request body exceeds the maximum upload size".to_string(),
            ));
        }
        tracing::debug!(error = %err.body_text(), "Failed to read multipart body");
        HttpAppError(AppError::InvalidInput(INVALID_MULTIPART_MESSAGE.to_string()))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, error_code, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, error_code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type, error_code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
        });

        (status, body).into_response()
    }
}
