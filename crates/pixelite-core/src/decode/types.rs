//! Core types for image decoding.

use serde::{Deserialize, Serialize};

use super::resize::target_dimensions;
use crate::error::PixelError;
use crate::transcode::{unpack, BytesPerPixel, PixelWords, UnpackOptions, WordLayout};

/// Options accepted by every decode backend.
///
/// When only one dimension is given, the other follows the source aspect
/// ratio. When both are given, the image is stretched to fill them exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodeOptions {
    /// Output width in pixels.
    pub width: Option<u32>,
    /// Output height in pixels.
    pub height: Option<u32>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Output dimensions for a `src_width x src_height` source.
    ///
    /// Shared by every backend so that sizing behaves the same everywhere.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::DecodeFailed` if a requested dimension is zero.
    pub fn output_size(&self, src_width: u32, src_height: u32) -> Result<(u32, u32), PixelError> {
        Ok(target_dimensions(src_width, src_height, self)?.unwrap_or((src_width, src_height)))
    }
}

/// Dimensions and channel count of a [`RawImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

/// A decoded image with RGBA pixel data.
///
/// Alpha is always present, even for opaque sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// RGBA pixel data in row-major order.
    /// Length is width * height * 4.
    pub data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Always [`RawImage::CHANNELS`].
    pub channels: u8,
}

impl RawImage {
    /// Channels per pixel in every decoded image.
    pub const CHANNELS: u8 = 4;

    /// Create a RawImage, checking that `data` holds `width * height` RGBA pixels.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::DecodeFailed` if the buffer size does not match.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PixelError> {
        let expected = (width as u64) * (height as u64) * u64::from(Self::CHANNELS);
        if data.len() as u64 != expected {
            return Err(PixelError::decode_failed(format!(
                "Pixel buffer size mismatch: expected {expected} bytes, got {}",
                data.len()
            ))
            .with_detail("width", width)
            .with_detail("height", height)
            .with_detail("byteLength", data.len()));
        }
        Ok(Self {
            data,
            width,
            height,
            channels: Self::CHANNELS,
        })
    }

    /// Create a RawImage from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            channels: Self::CHANNELS,
        }
    }

    pub fn info(&self) -> RawImageInfo {
        RawImageInfo {
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Unpack the pixel data into `0xAARRGGBB` words.
    pub fn to_words(&self, layout: WordLayout) -> Result<PixelWords, PixelError> {
        unpack(
            &self.data,
            UnpackOptions::new()
                .bytes_per_pixel(BytesPerPixel::Rgba)
                .layout(layout),
        )
    }
}
