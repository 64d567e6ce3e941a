use image::ImageError;
use imgconv_core::TargetFormat;

/// Failure of a single transcode
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Unsupported source encoding")]
    UnsupportedSourceEncoding,

    #[error("Corrupt input: {0}")]
    CorruptInput(String),

    #[error("Image too large: {0}")]
    TooLarge(String),

    #[error("Encoding to {format} failed: {reason}")]
    EncodingFailure {
        format: TargetFormat,
        reason: String,
    },
}

impl TranscodeError {
    /// Short description of the failure kind, safe to show to clients
    pub fn kind_description(&self) -> &'static str {
        match self {
            TranscodeError::UnsupportedSourceEncoding => "Unsupported source encoding",
            TranscodeError::CorruptInput(_) => "Corrupt or truncated image data",
            TranscodeError::TooLarge(_) => "Image exceeds the maximum decodable size",
            TranscodeError::EncodingFailure { .. } => "Failed to encode image",
        }
    }

    pub(crate) fn from_decode(err: ImageError) -> Self {
        match err {
            ImageError::Unsupported(_) => TranscodeError::UnsupportedSourceEncoding,
            ImageError::Limits(e) => TranscodeError::TooLarge(e.to_string()),
            other => TranscodeError::CorruptInput(other.to_string()),
        }
    }

    pub(crate) fn encoding(format: TargetFormat, reason: impl ToString) -> Self {
        TranscodeError::EncodingFailure {
            format,
            reason: reason.to_string(),
        }
    }
}
