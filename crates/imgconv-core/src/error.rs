//! Error types module
//!
//! All request-level failures are unified under `AppError`. Validation
//! variants carry the exact client-facing message; internal variants are
//! sensitive and render a generic message while the detail is logged.

use crate::formats::supported_ids;

/// Client message for every internal failure of the conversion endpoint
pub const CONVERSION_FAILED_MESSAGE: &str = "Failed to convert images";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UNSUPPORTED_FORMAT")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details must never reach the client
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing or invalid 'format'")]
    MissingOrInvalidFormat,

    #[error("Unsupported format. Supported formats: {}", supported_ids())]
    UnsupportedFormat(String),

    #[error("No files uploaded under field 'files'")]
    NoFilesUploaded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Conversion failed for {file}: {reason}")]
    ConversionFailed { file: String, reason: String },
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::MissingOrInvalidFormat => (400, "MISSING_FORMAT", false, LogLevel::Debug),
        AppError::UnsupportedFormat(_) => (400, "UNSUPPORTED_FORMAT", false, LogLevel::Debug),
        AppError::NoFilesUploaded => (400, "NO_FILES_UPLOADED", false, LogLevel::Debug),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Warn),
        AppError::ConversionFailed { .. } => (500, "CONVERSION_FAILED", true, LogLevel::Error),
    }
}

impl AppError {
    /// Variant name, used as a structured logging field
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MissingOrInvalidFormat => "MissingOrInvalidFormat",
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::NoFilesUploaded => "NoFilesUploaded",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::ConversionFailed { .. } => "ConversionFailed",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn client_message(&self) -> String {
        if self.is_sensitive() {
            return CONVERSION_FAILED_MESSAGE.to_string();
        }
        match self {
            AppError::InvalidInput(msg) | AppError::PayloadTooLarge(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}
