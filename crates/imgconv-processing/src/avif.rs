//! AVIF decoding
//!
//! The `image` crate's `"avif"` feature only provides the encoder (rav1e);
//! its decoder needs the dav1d C library. AVIF sources are decoded here with
//! `avif-parse` (container) and `rav1d` (pure Rust AV1 decoder) instead.

use std::io::Cursor;
use std::ptr::NonNull;

use image::{DynamicImage, RgbImage, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum AvifDecodeError {
    #[error("Failed to parse AVIF container: {0}")]
    Container(String),

    #[error("rav1d {stage} failed ({code})")]
    Decoder { stage: &'static str, code: i32 },

    #[error("Unsupported AVIF pixel layout: {0}")]
    UnsupportedLayout(String),

    #[error("Decoded AVIF picture is missing plane data")]
    MissingPlane,
}

/// Frame dimensions from the container metadata, without decoding.
pub fn dimensions(data: &[u8]) -> Result<(u32, u32), AvifDecodeError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(data))
        .map_err(|e| AvifDecodeError::Container(format!("{e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| AvifDecodeError::Container(format!("{e:?}")))?;
    Ok((meta.max_frame_width.get(), meta.max_frame_height.get()))
}

/// Decode the primary item of an AVIF file. When the file carries an alpha
/// auxiliary item the result is RGBA8, otherwise RGB8.
pub fn decode(data: &[u8]) -> Result<DynamicImage, AvifDecodeError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(data))
        .map_err(|e| AvifDecodeError::Container(format!("{e:?}")))?;

    let (width, height, rgb) = decode_av1(&avif.primary_item, YuvPlanes::to_rgb)?;

    let Some(alpha_item) = avif.alpha_item.as_deref() else {
        return RgbImage::from_raw(width, height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or(AvifDecodeError::MissingPlane);
    };

    let (alpha_width, alpha_height, alpha) = decode_av1(alpha_item, YuvPlanes::to_luma)?;
    if (alpha_width, alpha_height) != (width, height) {
        return Err(AvifDecodeError::UnsupportedLayout(format!(
            "alpha plane {}x{} does not match color plane {}x{}",
            alpha_width, alpha_height, width, height
        )));
    }

    let rgba = merge_alpha(&rgb, &alpha, avif.premultiplied_alpha);
    RgbaImage::from_raw(width, height, rgba)
        .map(DynamicImage::ImageRgba8)
        .ok_or(AvifDecodeError::MissingPlane)
}

/// Interleave an alpha plane into RGB8 samples, un-premultiplying if needed.
fn merge_alpha(rgb: &[u8], alpha: &[u8], premultiplied: bool) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(alpha.len() * 4);
    for (px, &a) in rgb.chunks_exact(3).zip(alpha) {
        for &c in px {
            let c = if premultiplied && a > 0 {
                ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
            } else {
                c
            };
            rgba.push(c);
        }
        rgba.push(a);
    }
    rgba
}

/// Decode one AV1 still frame with rav1d and hand its planes to `convert`.
/// The decoder and picture are always released before returning.
fn decode_av1<T>(
    av1_bytes: &[u8],
    convert: impl FnOnce(&YuvPlanes) -> Vec<T>,
) -> Result<(u32, u32, Vec<T>), AvifDecodeError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };
    use rav1d::include::dav1d::picture::Dav1dPicture;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe {
        rav1d::src::lib::dav1d_default_settings(NonNull::new_unchecked(settings.as_mut_ptr()))
    };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc =
        unsafe { rav1d::src::lib::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(AvifDecodeError::Decoder {
            stage: "open",
            code: rc.0,
        });
    }

    let mut data = Dav1dData::default();
    let buf_ptr =
        unsafe { rav1d::src::lib::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
    if buf_ptr.is_null() {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(AvifDecodeError::Decoder {
            stage: "data_create",
            code: -1,
        });
    }
    unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

    let rc = unsafe { rav1d::src::lib::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            rav1d::src::lib::dav1d_data_unref(NonNull::new(&mut data));
            rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(AvifDecodeError::Decoder {
            stage: "send_data",
            code: rc.0,
        });
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { rav1d::src::lib::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(AvifDecodeError::Decoder {
            stage: "get_picture",
            code: rc.0,
        });
    }

    let w = pic.p.w as u32;
    let h = pic.p.h as u32;
    let bpc = pic.p.bpc as u32;
    let layout = pic.p.layout;

    let planes = match (pic.data[0], pic.data[1], pic.data[2]) {
        (Some(y), u, v) => {
            let y_ptr = y.as_ptr() as *const u8;
            if layout == DAV1D_PIXEL_LAYOUT_I400 {
                Ok(YuvPlanes {
                    y_ptr,
                    u_ptr: y_ptr,
                    v_ptr: y_ptr,
                    y_stride: pic.stride[0],
                    uv_stride: 0,
                    width: w,
                    height: h,
                    bpc,
                    ss_x: false,
                    ss_y: false,
                    monochrome: true,
                })
            } else {
                let subsampling = match layout {
                    DAV1D_PIXEL_LAYOUT_I420 => Some((true, true)),
                    DAV1D_PIXEL_LAYOUT_I422 => Some((true, false)),
                    DAV1D_PIXEL_LAYOUT_I444 => Some((false, false)),
                    _ => None,
                };
                match (subsampling, u, v) {
                    (Some((ss_x, ss_y)), Some(u), Some(v)) => Ok(YuvPlanes {
                        y_ptr,
                        u_ptr: u.as_ptr() as *const u8,
                        v_ptr: v.as_ptr() as *const u8,
                        y_stride: pic.stride[0],
                        uv_stride: pic.stride[1],
                        width: w,
                        height: h,
                        bpc,
                        ss_x,
                        ss_y,
                        monochrome: false,
                    }),
                    (None, _, _) => Err(AvifDecodeError::UnsupportedLayout(format!("{layout}"))),
                    _ => Err(AvifDecodeError::MissingPlane),
                }
            }
        }
        (None, _, _) => Err(AvifDecodeError::MissingPlane),
    };

    let samples = planes.map(|planes| convert(&planes));
    unsafe {
        rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic));
        rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
    }

    Ok((w, h, samples?))
}

/// Decoded YUV plane data from rav1d, ready for RGB conversion.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling: horizontal, vertical (e.g. I420 = true, true)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// Convert YUV planes to interleaved RGB8 using BT.601 coefficients.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = vec![0u8; (self.width as usize) * (self.height as usize) * 3];

        for row in 0..self.height {
            for col in 0..self.width {
                let y_val = read_sample(self.y_ptr, self.y_stride, col, row, self.bpc);

                let (r, g, b) = if self.monochrome {
                    let v = (y_val * scale).clamp(0.0, 255.0);
                    (v, v, v)
                } else {
                    let u_col = if self.ss_x { col / 2 } else { col };
                    let u_row = if self.ss_y { row / 2 } else { row };
                    let cb = read_sample(self.u_ptr, self.uv_stride, u_col, u_row, self.bpc) - center;
                    let cr = read_sample(self.v_ptr, self.uv_stride, u_col, u_row, self.bpc) - center;

                    (
                        ((y_val + 1.402 * cr) * scale).clamp(0.0, 255.0),
                        ((y_val - 0.344136 * cb - 0.714136 * cr) * scale).clamp(0.0, 255.0),
                        ((y_val + 1.772 * cb) * scale).clamp(0.0, 255.0),
                    )
                };

                let idx = ((row as usize) * (self.width as usize) + col as usize) * 3;
                rgb[idx] = r as u8;
                rgb[idx + 1] = g as u8;
                rgb[idx + 2] = b as u8;
            }
        }

        rgb
    }

    /// Scale the Y plane to 8-bit samples. Used for the alpha auxiliary image.
    fn to_luma(&self) -> Vec<u8> {
        let scale = 255.0 / ((1u32 << self.bpc) - 1) as f32;
        let mut luma = Vec::with_capacity((self.width as usize) * (self.height as usize));
        for row in 0..self.height {
            for col in 0..self.width {
                let y_val = read_sample(self.y_ptr, self.y_stride, col, row, self.bpc);
                luma.push((y_val * scale).round().clamp(0.0, 255.0) as u8);
            }
        }
        luma
    }
}

/// Read one sample from a plane; 10/12-bit samples are stored as u16.
#[inline]
fn read_sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let byte_offset = y as isize * stride + x as isize * 2;
        (unsafe { (ptr.offset(byte_offset) as *const u16).read_unaligned() }) as f32
    }
}
