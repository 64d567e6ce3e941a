//! Image transcoding
//!
//! Decodes PNG, JPEG, WebP, AVIF, TIFF and GIF sources (detected from content)
//! and re-encodes them into any registry format.

pub mod avif;
pub mod compression;
pub mod error;
pub mod transcoder;

pub use compression::ImageCompressor;
pub use error::TranscodeError;
pub use transcoder::{transcode, ImageTranscoder, TranscodeOptions};
