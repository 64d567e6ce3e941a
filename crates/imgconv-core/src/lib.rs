//! imgconv core library
//!
//! Format registry, error types and configuration shared by the processing
//! and API crates.

pub mod config;
pub mod error;
pub mod formats;
pub mod quality;

// Re-export commonly used types
pub use config::{Config, FailurePolicy};
pub use error::{AppError, ErrorMetadata, LogLevel, CONVERSION_FAILED_MESSAGE};
pub use formats::{resolve, supported_ids, FormatEntry, TargetFormat, UnknownFormat, REGISTRY};
pub use quality::QualityPreset;
