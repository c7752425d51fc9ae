//! Resolution of heterogeneous image sources into one contiguous byte buffer.
//!
//! An [`ImageSource`] is one of:
//! - a byte buffer, returned as-is
//! - a string, fetched when it starts with `http://` or `https://` and read
//!   from the filesystem otherwise
//! - a whole fixed-length buffer, copied
//! - a typed view, sliced by byte offset and byte length
//! - anything else, which is rejected as unsupported
//!
//! Network and filesystem access go through a [`ByteLoader`], so the same
//! resolution rules apply on native targets ([`NativeLoader`]) and inside a
//! JavaScript host.

#[cfg(feature = "native-io")]
mod native;
mod view;

use std::collections::TryReserveError;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::error::{BoxError, PixelError};

#[cfg(feature = "native-io")]
pub use native::NativeLoader;
pub use view::{BufferView, ElementType};

/// An image source before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Bytes already in memory.
    Bytes(Vec<u8>),
    /// A remote `http(s)://` URL or a local filesystem path.
    Text(String),
    /// A whole fixed-length buffer.
    ArrayBuffer(Arc<[u8]>),
    /// A typed view over part of a buffer.
    View(BufferView),
    /// A value of a type no resolver understands.
    Other { type_name: String },
}

impl ImageSource {
    /// Name of the source's type, as reported in error details.
    pub fn type_name(&self) -> &str {
        match self {
            ImageSource::Bytes(_) => "Buffer",
            ImageSource::Text(_) => "string",
            ImageSource::ArrayBuffer(_) => "ArrayBuffer",
            ImageSource::View(view) => view.constructor_name(),
            ImageSource::Other { type_name } => type_name,
        }
    }

    pub fn other(type_name: impl Into<String>) -> Self {
        ImageSource::Other {
            type_name: type_name.into(),
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

impl From<String> for ImageSource {
    fn from(text: String) -> Self {
        ImageSource::Text(text)
    }
}

impl From<&str> for ImageSource {
    fn from(text: &str) -> Self {
        ImageSource::Text(text.to_string())
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Text(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::from(path.as_path())
    }
}

impl From<Arc<[u8]>> for ImageSource {
    fn from(buffer: Arc<[u8]>) -> Self {
        ImageSource::ArrayBuffer(buffer)
    }
}

impl From<BufferView> for ImageSource {
    fn from(view: BufferView) -> Self {
        ImageSource::View(view)
    }
}

/// Bytes produced by [`resolve`]. Carries no record of where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedBytes(Vec<u8>);

impl ResolvedBytes {
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for ResolvedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for ResolvedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<ResolvedBytes> for Vec<u8> {
    fn from(bytes: ResolvedBytes) -> Self {
        bytes.0
    }
}

/// Failure reported by [`ByteLoader::fetch`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    /// The request could not be completed.
    #[error("{0}")]
    Transport(#[source] BoxError),
}

impl FetchError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        FetchError::Transport(err.into())
    }
}

/// Network and filesystem access used by [`resolve`].
#[allow(async_fn_in_trait)]
pub trait ByteLoader {
    /// Fetch the body of a remote URL.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Read a local file.
    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Returns true if `text` starts with `http://` or `https://`, in any case.
pub fn is_remote_url(text: &str) -> bool {
    let has_prefix = |prefix: &str| {
        text.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("http://") || has_prefix("https://")
}

enum TextSource<'a> {
    Remote(&'a str),
    Local(&'a str),
}

impl<'a> TextSource<'a> {
    fn classify(text: &'a str) -> Self {
        if is_remote_url(text) {
            TextSource::Remote(text)
        } else {
            TextSource::Local(text)
        }
    }
}

/// Outcome of [`resolve_in_memory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The bytes are available without any I/O.
    Resolved(ResolvedBytes),
    /// A URL or path that still has to be loaded.
    Deferred(String),
}

/// Resolve every source that needs no I/O.
///
/// Text sources come back as [`Resolution::Deferred`] for [`resolve`] to load.
///
/// # Errors
///
/// - `ErrorKind::DecodeFailed` if a buffer or view cannot be converted.
/// - `ErrorKind::UnsupportedSource` for [`ImageSource::Other`].
pub fn resolve_in_memory(source: ImageSource) -> Result<Resolution, PixelError> {
    let bytes = match source {
        ImageSource::Bytes(bytes) => {
            trace!(len = bytes.len(), "source is already a byte buffer");
            bytes
        }
        ImageSource::Text(text) => return Ok(Resolution::Deferred(text)),
        ImageSource::ArrayBuffer(buffer) => copy_bytes(&buffer).map_err(|err| {
            PixelError::decode_failed("ArrayBuffer to byte buffer conversion failed")
                .with_detail("byteLength", buffer.len())
                .with_cause(err)
        })?,
        ImageSource::View(view) => {
            let bytes = view.as_bytes()?;
            trace!(
                constructor = view.constructor_name(),
                offset = view.byte_offset(),
                len = bytes.len(),
                "slicing typed view"
            );
            copy_bytes(bytes).map_err(|err| {
                PixelError::decode_failed("TypedArray to byte buffer conversion failed")
                    .with_detail("constructor", view.constructor_name())
                    .with_detail("byteLength", view.byte_length())
                    .with_cause(err)
            })?
        }
        ImageSource::Other { type_name } => {
            debug!(type_name = %type_name, "rejecting unsupported image source");
            return Err(PixelError::unsupported_source(format!(
                "Unsupported image source type: {type_name}"
            ))
            .with_detail("receivedType", type_name));
        }
    };
    Ok(Resolution::Resolved(ResolvedBytes(bytes)))
}

/// Resolve an image source into a contiguous byte buffer.
///
/// # Errors
///
/// - `ErrorKind::NetworkError` if a URL cannot be fetched or answers with a
///   non-success status (`details["url"]`).
/// - `ErrorKind::FileReadFailed` if a path cannot be read (`details["path"]`).
/// - `ErrorKind::DecodeFailed` if a buffer or view cannot be converted.
/// - `ErrorKind::UnsupportedSource` for [`ImageSource::Other`].
pub async fn resolve<L: ByteLoader>(
    loader: &L,
    source: ImageSource,
) -> Result<ResolvedBytes, PixelError> {
    match resolve_in_memory(source)? {
        Resolution::Resolved(bytes) => Ok(bytes),
        Resolution::Deferred(text) => resolve_text(loader, &text).await,
    }
}

async fn resolve_text<L: ByteLoader>(loader: &L, text: &str) -> Result<ResolvedBytes, PixelError> {
    match TextSource::classify(text) {
        TextSource::Remote(url) => {
            debug!(url, "fetching remote image source");
            match loader.fetch(url).await {
                Ok(bytes) => Ok(ResolvedBytes(bytes)),
                Err(err) => {
                    warn!(url, error = %err, "failed to fetch remote image source");
                    let error = PixelError::network(format!("Failed to fetch URL: {url}"))
                        .with_detail("url", url);
                    let error = match &err {
                        FetchError::Status { status, .. } => error.with_detail("status", status),
                        FetchError::Transport(_) => error,
                    };
                    Err(error.with_cause(err))
                }
            }
        }
        TextSource::Local(path) => {
            debug!(path, "reading local image source");
            loader.read_file(path).await.map(ResolvedBytes).map_err(|err| {
                PixelError::file_read(format!("Failed to read file: {path}"))
                    .with_detail("path", path)
                    .with_cause(err)
            })
        }
    }
}

fn copy_bytes(bytes: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let mut out = Vec::new();
    out.try_reserve_exact(bytes.len())?;
    out.extend_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::MockLoader;

    #[test]
    fn test_is_remote_url() {
        assert!(is_remote_url("http://example.com/a.png"));
        assert!(is_remote_url("https://example.com/a.png"));
        assert!(is_remote_url("HTTPS://EXAMPLE.COM/A.PNG"));
        assert!(!is_remote_url("ftp://example.com/a.png"));
        assert!(!is_remote_url("./http://not-a-url.png"));
        assert!(!is_remote_url("/tmp/image.png"));
        assert!(!is_remote_url("http:/missing-slash"));
        assert!(!is_remote_url(""));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ImageSource::from(vec![1u8]).type_name(), "Buffer");
        assert_eq!(ImageSource::from("a.png").type_name(), "string");
        assert_eq!(ImageSource::from(Arc::<[u8]>::from(vec![0u8])).type_name(), "ArrayBuffer");
        let view = BufferView::whole(vec![0u8; 4], ElementType::Float32);
        assert_eq!(ImageSource::from(view).type_name(), "Float32Array");
        assert_eq!(ImageSource::other("Map").type_name(), "Map");
    }

    #[test]
    fn test_in_memory_defers_text() {
        assert_eq!(
            resolve_in_memory("a.png".into()).unwrap(),
            Resolution::Deferred("a.png".to_string())
        );
        assert_eq!(
            resolve_in_memory(vec![1u8].into()).unwrap(),
            Resolution::Resolved(ResolvedBytes(vec![1]))
        );
    }

    #[tokio::test]
    async fn test_bytes_returned_unchanged() {
        let resolved = resolve(&MockLoader::default(), ImageSource::Bytes(vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(resolved.into_vec(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_array_buffer_copied() {
        let buffer: Arc<[u8]> = vec![9u8, 8, 7, 6].into();
        let resolved = resolve(&MockLoader::default(), ImageSource::ArrayBuffer(buffer))
            .await
            .unwrap();
        assert_eq!(&*resolved, &[9, 8, 7, 6]);
    }

    #[tokio::test]
    async fn test_view_does_not_leak_sibling_bytes() {
        let buffer: Vec<u8> = (0u8..12).collect();
        let view = BufferView::new(buffer, ElementType::Uint8, 4, 4);
        let resolved = resolve(&MockLoader::default(), ImageSource::View(view))
            .await
            .unwrap();
        assert_eq!(resolved.len(), 4);
        assert_eq!(&*resolved, &[4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_wide_view_uses_byte_length() {
        let buffer: Vec<u8> = (0u8..16).collect();
        // Two Uint16 elements starting at element 2 -> bytes 4..8
        let view = BufferView::from_elements(buffer, ElementType::Uint16, 2, 2);
        let resolved = resolve(&MockLoader::default(), view.into()).await.unwrap();
        assert_eq!(&*resolved, &[4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_view_out_of_range_is_decode_failure() {
        let view = BufferView::new(vec![0u8; 4], ElementType::Float32, 4, 4);
        let err = resolve(&MockLoader::default(), view.into()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailed);
        assert_eq!(err.detail("constructor"), Some("Float32Array"));
    }

    #[tokio::test]
    async fn test_local_path_read() {
        let loader = MockLoader::default().with_file("images/a.png", vec![1, 2]);
        let resolved = resolve(&loader, "images/a.png".into()).await.unwrap();
        assert_eq!(&*resolved, &[1, 2]);
    }

    #[tokio::test]
    async fn test_missing_file_is_file_read_error() {
        let err = resolve(&MockLoader::default(), "missing.png".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileReadFailed);
        assert_eq!(err.detail("path"), Some("missing.png"));
        assert!(err.cause().is_some());
    }

    #[tokio::test]
    async fn test_remote_url_fetched() {
        let loader = MockLoader::default().with_url("https://example.com/a.png", vec![7]);
        let resolved = resolve(&loader, "https://example.com/a.png".into())
            .await
            .unwrap();
        assert_eq!(&*resolved, &[7]);
    }

    #[tokio::test]
    async fn test_http_status_is_network_error() {
        let loader = MockLoader::default().with_status("http://example.com/gone.png", 404);
        let err = resolve(&loader, "http://example.com/gone.png".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert_eq!(err.detail("url"), Some("http://example.com/gone.png"));
        assert_eq!(err.detail("status"), Some("404"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let err = resolve(&MockLoader::default(), "http://unreachable.invalid/".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert_eq!(err.detail("url"), Some("http://unreachable.invalid/"));
        assert_eq!(err.detail("status"), None);
    }

    #[tokio::test]
    async fn test_remote_url_never_hits_filesystem() {
        // A file registered under the URL string must not be used
        let loader = MockLoader::default().with_file("http://example.com/a.png", vec![1]);
        let err = resolve(&loader, "http://example.com/a.png".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn test_unknown_type_is_unsupported() {
        let err = resolve(&MockLoader::default(), ImageSource::other("WeakMap"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSource);
        assert_eq!(err.detail("receivedType"), Some("WeakMap"));
        assert!(err.message().contains("WeakMap"));
    }
}
