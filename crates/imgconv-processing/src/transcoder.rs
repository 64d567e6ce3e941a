//! Image transcoder - decode from any supported encoding, re-encode to a target

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use imgconv_core::{QualityPreset, TargetFormat};
use std::io::Cursor;

use crate::avif;
use crate::compression::ImageCompressor;
use crate::error::TranscodeError;

/// Settings applied to every transcode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeOptions {
    pub quality: QualityPreset,
    /// Maximum width * height accepted for decode; `None` is unlimited
    pub max_decode_pixels: Option<u64>,
}

/// Decodes images of any supported source encoding and re-encodes them
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTranscoder {
    options: TranscodeOptions,
}

impl ImageTranscoder {
    pub fn new(options: TranscodeOptions) -> Self {
        Self { options }
    }

    /// Transcode `data` into `target`. The source encoding is sniffed from
    /// the content; file names and declared content types play no part.
    pub fn transcode(&self, data: &[u8], target: TargetFormat) -> Result<Bytes, TranscodeError> {
        let img = self.decode(data)?;
        ImageCompressor::compress(&img, target, self.options.quality)
    }

    /// Decode the first frame of `data`
    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage, TranscodeError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TranscodeError::CorruptInput(e.to_string()))?;
        let format = reader
            .format()
            .ok_or(TranscodeError::UnsupportedSourceEncoding)?;

        tracing::debug!(source_format = ?format, input_bytes = data.len(), "Decoding image");

        if format == ImageFormat::Avif {
            if self.options.max_decode_pixels.is_some() {
                let (width, height) = avif::dimensions(data)
                    .map_err(|e| TranscodeError::CorruptInput(e.to_string()))?;
                self.check_pixel_limit(width, height)?;
            }
            return avif::decode(data).map_err(|e| TranscodeError::CorruptInput(e.to_string()));
        }

        if !format.reading_enabled() {
            return Err(TranscodeError::UnsupportedSourceEncoding);
        }

        if self.options.max_decode_pixels.is_some() {
            let (width, height) = ImageReader::with_format(Cursor::new(data), format)
                .into_dimensions()
                .map_err(TranscodeError::from_decode)?;
            self.check_pixel_limit(width, height)?;
        }

        let mut reader = reader;
        reader.no_limits();
        let img = reader.decode().map_err(TranscodeError::from_decode)?;

        let (width, height) = img.dimensions();
        tracing::debug!(width, height, color = ?img.color(), "Decoded image");
        Ok(img)
    }

    fn check_pixel_limit(&self, width: u32, height: u32) -> Result<(), TranscodeError> {
        match self.options.max_decode_pixels {
            Some(max) if u64::from(width) * u64::from(height) > max => {
                Err(TranscodeError::TooLarge(format!(
                    "{}x{} exceeds the limit of {} pixels",
                    width, height, max
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Transcode with default options (unlimited decode, normal quality)
pub fn transcode(data: &[u8], target: TargetFormat) -> Result<Bytes, TranscodeError> {
    ImageTranscoder::default().transcode(data, target)
}
