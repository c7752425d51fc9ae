//! Shared test fixtures.

use std::collections::HashMap;
use std::io::{self, Cursor};

use image::{DynamicImage, ImageFormat, RgbImage, Rgba, RgbaImage};

use crate::source::{ByteLoader, FetchError};

/// In-memory [`ByteLoader`]. Unknown URLs fail with a transport error and
/// unknown paths with `NotFound`.
#[derive(Debug, Default)]
pub(crate) struct MockLoader {
    files: HashMap<String, Vec<u8>>,
    urls: HashMap<String, Result<Vec<u8>, u16>>,
}

impl MockLoader {
    pub(crate) fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }

    pub(crate) fn with_url(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.urls.insert(url.to_string(), Ok(bytes));
        self
    }

    pub(crate) fn with_status(mut self, url: &str, status: u16) -> Self {
        self.urls.insert(url.to_string(), Err(status));
        self
    }
}

impl ByteLoader for MockLoader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.urls.get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                status: *status,
                reason: "Mock Status".to_string(),
            }),
            None => Err(FetchError::transport("connection refused")),
        }
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// Encode a `width x height` opaque RGB gradient as PNG.
pub(crate) fn rgb_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 40) as u8, (y * 40) as u8, 128])
    });
    encode_png(DynamicImage::ImageRgb8(img))
}

/// Encode a single RGBA pixel as PNG.
pub(crate) fn rgba_png_pixel(pixel: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(1, 1, Rgba(pixel));
    encode_png(DynamicImage::ImageRgba8(img))
}

fn encode_png(img: DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encoding should succeed");
    bytes
}
