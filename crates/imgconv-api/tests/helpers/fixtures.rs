//! Test fixtures: small images encoded through the `image` crate.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7) as u8, (y * 11) as u8, 160, 255])
    }))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format)
        .expect("Failed to encode fixture");
    cursor.into_inner()
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(gradient(width, height).to_rgb8()), ImageFormat::Jpeg)
}

pub fn create_test_gif(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Gif)
}

/// Bytes that no decoder recognizes
pub fn create_text_file() -> Vec<u8> {
    b"SECRET-CONTENT: this is a plain text file, not an image".to_vec()
}

/// Split a data URI into its MIME type and decoded payload
pub fn decode_data_url(data_url: &str) -> (String, Vec<u8>) {
    use base64::Engine;

    let rest = data_url.strip_prefix("data:").expect("not a data URI");
    let (mime, payload) = rest.split_once(";base64,").expect("not a base64 data URI");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .expect("invalid base64 payload");
    (mime.to_string(), bytes)
}
