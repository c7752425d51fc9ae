//! Output sizing shared by the decode backends.
//!
//! Resizing uses nearest-neighbour sampling and "fill" semantics: the image
//! is stretched to the requested box without preserving aspect ratio.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::DecodeOptions;
use crate::error::PixelError;

/// Work out the output dimensions for a `src_width x src_height` source.
///
/// Returns `None` when no resize was requested. A single missing dimension
/// is derived from the source aspect ratio.
///
/// # Errors
///
/// Returns `ErrorKind::DecodeFailed` if a requested dimension is zero.
pub(crate) fn target_dimensions(
    src_width: u32,
    src_height: u32,
    options: &DecodeOptions,
) -> Result<Option<(u32, u32)>, PixelError> {
    let (width, height) = match (options.width, options.height) {
        (None, None) => return Ok(None),
        (Some(width), Some(height)) => (width, height),
        (Some(width), None) => (width, scale_edge(src_height, width, src_width)),
        (None, Some(height)) => (scale_edge(src_width, height, src_height), height),
    };

    if width == 0 || height == 0 {
        return Err(PixelError::decode_failed(format!(
            "Invalid output dimensions (width: {width}, height: {height})"
        ))
        .with_detail("width", width)
        .with_detail("height", height)
        .with_detail("sourceWidth", src_width)
        .with_detail("sourceHeight", src_height));
    }

    Ok(Some((width, height)))
}

/// Scale `edge` by `target / base`, rounding and never going below 1.
fn scale_edge(edge: u32, target: u32, base: u32) -> u32 {
    if target == 0 {
        return 0;
    }
    let scaled = (edge as f64 * target as f64 / base.max(1) as f64).round();
    (scaled as u32).max(1)
}

/// Stretch an image to exactly `width x height` with nearest-neighbour sampling.
pub(crate) fn resize_fill(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    // Fast path: if dimensions match, keep the buffer
    if image.dimensions() == (width, height) {
        return image;
    }
    imageops::resize(&image, width, height, FilterType::Nearest)
}
