//! Native raster backend built on the `image` crate.

use std::io::Cursor;
use std::sync::OnceLock;

use image::{ImageReader, Limits};
use tracing::debug;

use super::resize::{resize_fill, target_dimensions};
use super::{DecodeOptions, RawImage};
use crate::error::PixelError;

/// Decodes container formats (PNG, JPEG, GIF, WebP, BMP) into RGBA pixels.
#[derive(Debug, Clone, Default)]
pub struct NativeBackend {
    limits: Limits,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom decoding limits (maximum dimensions and allocation).
    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }

    /// Decode an encoded image into RGBA pixels.
    ///
    /// Alpha is always added. When `options` requests a size, the image is
    /// resized with nearest-neighbour sampling to fill it.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::DecodeFailed` if the format is not recognized, the
    /// data is corrupted, a limit is exceeded, or a requested dimension is zero.
    /// Requested output sizes are held to the same dimension and allocation
    /// limits as the decoded source.
    pub fn decode(&self, bytes: &[u8], options: &DecodeOptions) -> Result<RawImage, PixelError> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| {
                PixelError::decode_failed("Failed to read image header")
                    .with_detail("byteLength", bytes.len())
                    .with_cause(e)
            })?;

        let format = reader.format().ok_or_else(|| {
            PixelError::decode_failed("Unrecognized image format")
                .with_detail("byteLength", bytes.len())
        })?;
        reader.limits(self.limits.clone());

        let img = reader.decode().map_err(|e| {
            PixelError::decode_failed(format!("Failed to decode {format:?} image"))
                .with_detail("format", format!("{format:?}"))
                .with_detail("byteLength", bytes.len())
                .with_cause(e)
        })?;

        let rgba = img.into_rgba8();
        let (src_width, src_height) = rgba.dimensions();
        let rgba = match target_dimensions(src_width, src_height, options)? {
            Some((width, height)) => {
                self.check_output_size(width, height, src_width, src_height)?;
                resize_fill(rgba, width, height)
            }
            None => rgba,
        };

        debug!(
            ?format,
            src_width,
            src_height,
            width = rgba.width(),
            height = rgba.height(),
            "decoded image"
        );
        Ok(RawImage::from_rgba_image(rgba))
    }
}

impl NativeBackend {
    /// Check a resize target against the configured limits before any
    /// buffer for it is allocated.
    fn check_output_size(
        &self,
        width: u32,
        height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Result<(), PixelError> {
        let byte_len = u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|pixels| pixels.checked_mul(u64::from(RawImage::CHANNELS)));
        let exceeds = |max: Option<u32>, value: u32| max.is_some_and(|max| value > max);

        let reason = if exceeds(self.limits.max_image_width, width)
            || exceeds(self.limits.max_image_height, height)
        {
            Some("exceeds the dimension limit")
        } else {
            match byte_len {
                None => Some("overflows the pixel buffer size"),
                Some(len) if self.limits.max_alloc.is_some_and(|max| len > max) => {
                    Some("exceeds the allocation limit")
                }
                Some(len) if usize::try_from(len).map_or(true, |len| len > isize::MAX as usize) => {
                    Some("overflows the pixel buffer size")
                }
                Some(_) => None,
            }
        };

        match reason {
            None => Ok(()),
            Some(reason) => Err(PixelError::decode_failed(format!(
                "Requested output size {width}x{height} {reason}"
            ))
            .with_detail("width", width)
            .with_detail("height", height)
            .with_detail("sourceWidth", src_width)
            .with_detail("sourceHeight", src_height)),
        }
    }
}

static NATIVE_BACKEND: OnceLock<NativeBackend> = OnceLock::new();

/// The process-wide native backend, created on first use.
///
/// Concurrent first calls may race to build it, but every caller observes
/// the same instance.
pub fn native_backend() -> &'static NativeBackend {
    NATIVE_BACKEND.get_or_init(NativeBackend::default)
}
