//! Pixelite Core - pixel transcoding and image source normalization
//!
//! This crate turns image sources (paths, URLs, byte buffers, typed views)
//! into raw RGBA pixels, and converts between packed `0xAARRGGBB` words and
//! byte-interleaved RGB/RGBA buffers.
//!
//! # Module Structure
//!
//! - `transcode` - `pack` / `unpack` between pixel words and byte buffers
//! - `source` - Resolution of heterogeneous sources into bytes
//! - `decode` - Native decoding with the `image` crate
//! - `dispatch` - Per-call choice between the native and canvas backends
//! - `error` - Classified errors shared by all of the above
//!
//! # Usage
//!
//! ```ignore
//! use pixelite_core::{decode, pack, unpack, DecodeOptions, UnpackOptions};
//!
//! let image = decode("photo.png", &DecodeOptions::new()).await?;
//! let words = unpack(&image.data, UnpackOptions::new())?;
//! assert_eq!(pack(&words), image.data);
//! ```

pub mod decode;
pub mod dispatch;
pub mod error;
pub mod source;
pub mod transcode;

#[cfg(test)]
mod testing;

pub use decode::{native_backend, DecodeOptions, NativeBackend, RawImage, RawImageInfo};
pub use dispatch::{
    route, CanvasBackend, CanvasInput, DispatchError, Dispatcher, Environment, Input, NoCanvas,
    NoPlatform, PlatformSource, Route,
};
pub use error::{ErrorKind, PixelError};
pub use source::{
    is_remote_url, resolve, resolve_in_memory, BufferView, ByteLoader, ElementType, FetchError,
    ImageSource, Resolution, ResolvedBytes,
};
pub use transcode::{
    detect_bytes_per_pixel, pack, pack_into, unpack, BytesPerPixel, IntoPixelWord, PixelWords,
    UnpackOptions, WordLayout,
};

#[cfg(feature = "native-io")]
pub use source::NativeLoader;

/// Decode an image source on a native host.
///
/// Paths are read from disk, `http(s)://` URLs are fetched, and buffers are
/// used directly. The result always has 4 channels.
///
/// # Errors
///
/// Returns the classified [`PixelError`] from resolution or decoding, wrapped
/// in [`DispatchError::Pixel`].
#[cfg(feature = "native-io")]
pub async fn decode(
    source: impl Into<ImageSource>,
    options: &DecodeOptions,
) -> Result<RawImage, DispatchError> {
    Dispatcher::native(NativeLoader::new())
        .decode(Input::Source(source.into()), options)
        .await
}

#[cfg(all(test, feature = "native-io"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decode_buffer() {
        let png = testing::rgb_png(2, 3);
        let img = decode(png, &DecodeOptions::new()).await.unwrap();
        assert_eq!(img.info(), RawImageInfo { width: 2, height: 3, channels: 4 });
    }

    #[tokio::test]
    async fn test_decode_file_roundtrips_through_transcoder() {
        let path = std::env::temp_dir().join(format!("pixelite-lib-{}.png", std::process::id()));
        std::fs::write(&path, testing::rgb_png(4, 4)).unwrap();

        let result = decode(path.clone(), &DecodeOptions::new()).await;
        std::fs::remove_file(&path).ok();
        let img = result.unwrap();

        let words = unpack(&img.data, UnpackOptions::new()).unwrap();
        assert_eq!(words.len(), 16);
        assert!(words.iter().all(|w| w >> 24 == 0xFF));
        assert_eq!(pack(&words), img.data);
    }

    #[tokio::test]
    async fn test_decode_missing_file() {
        let err = decode("/nonexistent/pixelite/image.png", &DecodeOptions::new())
            .await
            .unwrap_err();
        assert_eq!(
            err.as_pixel_error().map(PixelError::kind),
            Some(ErrorKind::FileReadFailed)
        );
    }
}
