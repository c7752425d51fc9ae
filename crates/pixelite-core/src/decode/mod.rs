//! Native image decoding for Pixelite.
//!
//! This module provides:
//! - The [`RawImage`] type every backend produces (RGBA, 4 channels)
//! - [`DecodeOptions`] for optional output sizing
//! - The [`NativeBackend`] that decodes container formats with the `image` crate
//!
//! # Architecture
//!
//! The backend only sees resolved bytes; turning paths, URLs and buffers
//! into bytes is the job of [`crate::source`]. Decoding is synchronous and
//! CPU-bound.
//!
//! # Examples
//!
//! ```ignore
//! use pixelite_core::decode::{native_backend, DecodeOptions};
//!
//! let png = std::fs::read("photo.png").unwrap();
//! let image = native_backend().decode(&png, &DecodeOptions::new()).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod native;
mod resize;
mod types;

pub use native::{native_backend, NativeBackend};
pub use types::{DecodeOptions, RawImage, RawImageInfo};
