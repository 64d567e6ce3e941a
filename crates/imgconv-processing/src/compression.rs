//! Target encoders
//!
//! One encoder per registry format. Lossy formats take their quality from a
//! `QualityPreset`; PNG, TIFF and GIF go through the `image` crate encoders.

use bytes::Bytes;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use imgconv_core::{QualityPreset, TargetFormat};
use rgb::FromSlice;
use std::any::Any;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};

use crate::error::TranscodeError;

/// AVIF encoder speed (1 slowest/smallest, 10 fastest)
const AVIF_SPEED: u8 = 6;

/// Main compression service
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode a decoded image into the target format
    pub fn compress(
        img: &DynamicImage,
        format: TargetFormat,
        quality: QualityPreset,
    ) -> Result<Bytes, TranscodeError> {
        let (width, height) = img.dimensions();
        tracing::debug!(
            format = %format,
            width,
            height,
            quality = ?quality,
            "Encoding image"
        );

        match format {
            TargetFormat::Jpeg => Self::compress_jpeg(img, quality),
            TargetFormat::WebP => Self::compress_webp(img, quality),
            TargetFormat::Avif => Self::compress_avif(img, quality),
            TargetFormat::Png => Self::write_with_image(&Self::normalize_for_png(img), format),
            TargetFormat::Tiff => Self::write_with_image(&Self::normalize_for_tiff(img), format),
            TargetFormat::Gif => Self::write_with_image(&DynamicImage::ImageRgba8(img.to_rgba8()), format),
        }
    }

    /// Compress to JPEG using mozjpeg. Alpha is discarded.
    ///
    /// libjpeg reports fatal errors (for example a dimension above 65500) by
    /// unwinding, so the whole encode runs under `catch_unwind`.
    fn compress_jpeg(img: &DynamicImage, quality: QualityPreset) -> Result<Bytes, TranscodeError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let encoded = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
            let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
            comp.set_size(width as usize, height as usize);
            comp.set_quality(quality.jpeg_quality() as f32);
            comp.set_progressive_mode();
            comp.set_optimize_coding(true);

            let mut comp = comp.start_compress(Vec::new())?;
            comp.write_scanlines(rgb_img.as_raw())?;
            comp.finish()
        }));

        match encoded {
            Ok(Ok(jpeg_data)) => Ok(Bytes::from(jpeg_data)),
            Ok(Err(e)) => Err(TranscodeError::encoding(TargetFormat::Jpeg, e)),
            Err(payload) => Err(TranscodeError::encoding(
                TargetFormat::Jpeg,
                unwind_message(payload.as_ref()),
            )),
        }
    }

    /// Compress to lossy WebP
    fn compress_webp(img: &DynamicImage, quality: QualityPreset) -> Result<Bytes, TranscodeError> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder
            .encode_simple(false, quality.webp_quality())
            .map_err(|e| TranscodeError::encoding(TargetFormat::WebP, format!("{e:?}")))?;

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    /// Compress to AVIF, keeping the alpha channel
    fn compress_avif(img: &DynamicImage, quality: QualityPreset) -> Result<Bytes, TranscodeError> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let img_buf = ravif::Img::new(
            rgba_img.as_raw().as_rgba(),
            width as usize,
            height as usize,
        );

        let encoder = ravif::Encoder::new()
            .with_quality(quality.avif_quality() as f32)
            .with_speed(AVIF_SPEED);

        let avif_data = encoder
            .encode_rgba(img_buf)
            .map_err(|e| TranscodeError::encoding(TargetFormat::Avif, e))?;

        Ok(Bytes::from(avif_data.avif_file))
    }

    fn write_with_image(img: &DynamicImage, format: TargetFormat) -> Result<Bytes, TranscodeError> {
        let image_format = match format {
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Tiff => ImageFormat::Tiff,
            TargetFormat::Gif => ImageFormat::Gif,
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::WebP => ImageFormat::WebP,
            TargetFormat::Avif => ImageFormat::Avif,
        };

        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image_format)
            .map_err(|e| TranscodeError::encoding(format, e))?;

        Ok(Bytes::from(cursor.into_inner()))
    }

    /// PNG takes 8/16-bit integer buffers; float sources are narrowed to 8-bit.
    fn normalize_for_png(img: &DynamicImage) -> DynamicImage {
        match img.color() {
            ColorType::Rgb32F => DynamicImage::ImageRgb8(img.to_rgb8()),
            ColorType::Rgba32F => DynamicImage::ImageRgba8(img.to_rgba8()),
            _ => img.clone(),
        }
    }

    /// TIFF takes gray, RGB and RGBA at 8/16 bits; everything else becomes RGB(A)8.
    fn normalize_for_tiff(img: &DynamicImage) -> DynamicImage {
        match img.color() {
            ColorType::L8
            | ColorType::L16
            | ColorType::Rgb8
            | ColorType::Rgb16
            | ColorType::Rgba8
            | ColorType::Rgba16 => img.clone(),
            color if color.has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
            _ => DynamicImage::ImageRgb8(img.to_rgb8()),
        }
    }
}

fn unwind_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "libjpeg aborted".to_string())
}
