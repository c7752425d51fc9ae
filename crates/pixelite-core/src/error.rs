//! Classified errors shared by the transcoder, the resolver and the backends.
//!
//! Every failure that reaches a caller is a [`PixelError`] carrying an
//! [`ErrorKind`], a human-readable message, a map of structured details
//! (URL, path, type name, byte length, ...) and optionally the error that
//! caused it.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Boxed error used as the wrapped cause of a [`PixelError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The closed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Backend decode/transform failure or buffer-shape conversion failure.
    DecodeFailed,
    /// Remote fetch failed or returned a non-success status.
    NetworkError,
    /// Local file read failed.
    FileReadFailed,
    /// Input matches none of the recognized source shapes.
    UnsupportedSource,
    /// Buffer length is not a multiple of the requested bytes-per-pixel.
    InvalidLength,
    /// Buffer length is a multiple of neither 3 nor 4.
    AmbiguousLength,
}

impl ErrorKind {
    /// Stable error code exposed across the JS boundary.
    ///
    /// The two length kinds are sub-cases of a decode failure and share its code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::DecodeFailed | ErrorKind::InvalidLength | ErrorKind::AmbiguousLength => {
                "DECODE_FAILED"
            }
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::FileReadFailed => "FILE_READ_FAILED",
            ErrorKind::UnsupportedSource => "UNSUPPORTED_SOURCE",
        }
    }

    /// Returns true for `DecodeFailed` and its length sub-cases.
    pub fn is_decode_failure(self) -> bool {
        matches!(
            self,
            ErrorKind::DecodeFailed | ErrorKind::InvalidLength | ErrorKind::AmbiguousLength
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A classified failure.
///
/// Built once at the point of failure and then only moved, never modified,
/// on its way to the caller.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PixelError {
    kind: ErrorKind,
    message: String,
    details: BTreeMap<String, String>,
    #[source]
    cause: Option<BoxError>,
}

impl PixelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: BTreeMap::new(),
            cause: None,
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DecodeFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn file_read(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileReadFailed, message)
    }

    pub fn unsupported_source(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedSource, message)
    }

    /// Wrap an unclassified error that crossed a component boundary.
    pub fn wrap<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::decode_failed(err.to_string()).with_cause(err)
    }

    /// Attach a structured detail. Used while building the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }

    /// Attach the underlying cause. Used while building the error.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    /// Look up a single detail value.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}
