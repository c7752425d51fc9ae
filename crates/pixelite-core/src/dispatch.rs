//! Environment dispatch: decide per call which backend services an input.
//!
//! Two environments exist. A native (server-like) process decodes with the
//! `image` crate after resolving the input to bytes. A browser-like host
//! decodes with its canvas facilities. The dispatcher only checks that the
//! input makes sense for the current environment and hands it off; it never
//! decodes anything itself.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::decode::{native_backend, DecodeOptions, RawImage};
use crate::error::PixelError;
use crate::source::{resolve, ByteLoader, ImageSource};

/// Where the current call is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Native raster library available.
    Native,
    /// Platform canvas/bitmap API available.
    Browser,
}

impl Environment {
    /// Environment implied by the compile target.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Environment::Browser
        } else {
            Environment::Native
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Native => f.write_str("server"),
            Environment::Browser => f.write_str("browser"),
        }
    }
}

/// An input that only a platform canvas backend can decode
/// (image elements, bitmaps, blobs, ...).
pub trait PlatformSource {
    fn type_name(&self) -> &str;
}

/// Platform source type for hosts without a canvas backend. Has no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPlatform {}

impl PlatformSource for NoPlatform {
    fn type_name(&self) -> &str {
        match *self {}
    }
}

/// A decode input before routing.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<P> {
    /// A source the byte resolver understands.
    Source(ImageSource),
    /// A platform object.
    Platform(P),
}

impl<P> From<ImageSource> for Input<P> {
    fn from(source: ImageSource) -> Self {
        Input::Source(source)
    }
}

/// What the canvas backend receives.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasInput<P> {
    /// A URL to fetch and decode.
    Url(String),
    /// A platform object to rasterize directly.
    Object(P),
}

/// Outcome of [`route`].
#[derive(Debug, Clone, PartialEq)]
pub enum Route<P> {
    Native(ImageSource),
    Canvas(CanvasInput<P>),
}

/// Errors from [`Dispatcher::decode`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The input is well-typed, but for the other environment.
    #[error("Invalid input type for {environment} environment: {type_name}")]
    InvalidInputType {
        environment: Environment,
        type_name: String,
    },

    /// A classified failure from resolution or decoding, passed through unchanged.
    #[error(transparent)]
    Pixel(#[from] PixelError),
}

impl DispatchError {
    pub fn as_pixel_error(&self) -> Option<&PixelError> {
        match self {
            DispatchError::Pixel(err) => Some(err),
            DispatchError::InvalidInputType { .. } => None,
        }
    }
}

/// Decide which backend handles `input` in `environment`.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidInputType`] for platform objects in a
/// native environment, and for anything other than a string or a platform
/// object in a browser environment.
pub fn route<P: PlatformSource>(
    environment: Environment,
    input: Input<P>,
) -> Result<Route<P>, DispatchError> {
    let route = match (environment, input) {
        (Environment::Native, Input::Source(source)) => Route::Native(source),
        (Environment::Browser, Input::Platform(object)) => Route::Canvas(CanvasInput::Object(object)),
        (Environment::Browser, Input::Source(ImageSource::Text(url))) => {
            Route::Canvas(CanvasInput::Url(url))
        }
        (Environment::Native, Input::Platform(object)) => {
            return Err(invalid_input(environment, object.type_name()));
        }
        (Environment::Browser, Input::Source(source)) => {
            return Err(invalid_input(environment, source.type_name()));
        }
    };
    Ok(route)
}

fn invalid_input(environment: Environment, type_name: &str) -> DispatchError {
    debug!(%environment, type_name, "input does not fit the current environment");
    DispatchError::InvalidInputType {
        environment,
        type_name: type_name.to_string(),
    }
}

/// The canvas collaborator: rasterizes a platform object or a fetched URL
/// onto an off-screen surface and reads back RGBA bytes.
#[allow(async_fn_in_trait)]
pub trait CanvasBackend {
    type Source: PlatformSource;

    async fn decode(
        &self,
        input: CanvasInput<Self::Source>,
        options: &DecodeOptions,
    ) -> Result<RawImage, PixelError>;
}

/// Canvas backend for hosts that have none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCanvas;

impl CanvasBackend for NoCanvas {
    type Source = NoPlatform;

    async fn decode(
        &self,
        input: CanvasInput<NoPlatform>,
        _options: &DecodeOptions,
    ) -> Result<RawImage, PixelError> {
        match input {
            CanvasInput::Object(never) => match never {},
            CanvasInput::Url(url) => Err(PixelError::decode_failed(
                "No canvas backend is available in this environment",
            )
            .with_detail("sourceURL", url)),
        }
    }
}

/// Routes each call to the native pipeline or to a canvas backend.
///
/// The environment probe runs on every call; its answer is never cached.
#[derive(Debug, Clone)]
pub struct Dispatcher<L, C = NoCanvas> {
    loader: L,
    canvas: C,
    probe: fn() -> Environment,
}

impl<L: ByteLoader> Dispatcher<L, NoCanvas> {
    /// A dispatcher with no canvas backend.
    pub fn native(loader: L) -> Self {
        Self::new(loader, NoCanvas)
    }
}

impl<L: ByteLoader, C: CanvasBackend> Dispatcher<L, C> {
    /// Create a dispatcher that probes with [`Environment::detect`].
    pub fn new(loader: L, canvas: C) -> Self {
        Self {
            loader,
            canvas,
            probe: Environment::detect,
        }
    }

    /// Replace the environment probe.
    pub fn with_probe(mut self, probe: fn() -> Environment) -> Self {
        self.probe = probe;
        self
    }

    /// Run the probe.
    pub fn environment(&self) -> Environment {
        (self.probe)()
    }

    /// Decode `input` with the backend that fits the current environment.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidInputType`] if the input belongs to the other
    ///   environment.
    /// - [`DispatchError::Pixel`] carrying the classified error from
    ///   resolution or decoding, unchanged.
    pub async fn decode(
        &self,
        input: Input<C::Source>,
        options: &DecodeOptions,
    ) -> Result<RawImage, DispatchError> {
        let environment = self.environment();
        let image = match route(environment, input)? {
            Route::Native(source) => {
                debug!(source = source.type_name(), "decoding with native backend");
                let bytes = resolve(&self.loader, source).await?;
                native_backend().decode(&bytes, options)?
            }
            Route::Canvas(input) => {
                debug!("decoding with canvas backend");
                self.canvas.decode(input, options).await?
            }
        };
        debug!(%environment, info = ?image.info(), "decode finished");
        Ok(image)
    }
}
