//! Canvas decoding backend.
//!
//! Every input is turned into an `ImageBitmap`, drawn onto an
//! `OffscreenCanvas` of the output size with image smoothing disabled, and
//! read back as RGBA bytes.
//!
//! SVG documents cannot go through `createImageBitmap` directly. They are
//! loaded into an `HTMLImageElement` from an object URL and drawn onto an
//! intermediate canvas first.

use js_sys::{Object, Reflect};
use pixelite_core::{
    CanvasBackend, CanvasInput, DecodeOptions, PixelError, PlatformSource, RawImage,
};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, HtmlImageElement, ImageBitmap, OffscreenCanvas, OffscreenCanvasRenderingContext2d, Url,
};

use crate::error::JsFailure;
use crate::source::{call_global, fetch_response, BrowserSource};

const SVG_MIME_TYPE: &str = "image/svg+xml";

/// Failure inside the canvas pipeline.
///
/// Classified errors leave [`CanvasDecoder::decode`] unchanged; raw
/// JavaScript exceptions are wrapped as decode failures.
enum CanvasFailure {
    Classified(PixelError),
    Js(JsValue),
}

impl From<PixelError> for CanvasFailure {
    fn from(err: PixelError) -> Self {
        CanvasFailure::Classified(err)
    }
}

impl From<JsValue> for CanvasFailure {
    fn from(value: JsValue) -> Self {
        CanvasFailure::Js(value)
    }
}

/// Closes the bitmap when dropped, on every exit path.
struct OpenBitmap(ImageBitmap);

impl Drop for OpenBitmap {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Revokes the object URL when dropped.
struct ObjectUrl(String);

impl ObjectUrl {
    fn new(blob: &Blob) -> Result<Self, JsValue> {
        Url::create_object_url_with_blob(blob).map(Self)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let _ = Url::revoke_object_url(&self.0);
    }
}

/// Canvas backend using `fetch`, `createImageBitmap` and `OffscreenCanvas`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasDecoder;

impl CanvasDecoder {
    pub fn new() -> Self {
        Self
    }

    async fn rasterize(
        &self,
        input: &CanvasInput<BrowserSource>,
        options: &DecodeOptions,
    ) -> Result<RawImage, CanvasFailure> {
        let bitmap = OpenBitmap(match input {
            CanvasInput::Url(url) => bitmap_from_url(url).await?,
            CanvasInput::Object(source) => bitmap_from_object(source).await?,
        });

        let (source_width, source_height) = (bitmap.0.width(), bitmap.0.height());
        let (width, height) = options.output_size(source_width, source_height)?;

        let canvas = OffscreenCanvas::new(width, height)?;
        let context = rendering_context(&canvas)?;
        context.set_image_smoothing_enabled(false);
        context.draw_image_with_image_bitmap_and_dw_and_dh(
            &bitmap.0,
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        )?;

        let image_data = context.get_image_data(0.0, 0.0, f64::from(width), f64::from(height))?;
        debug!(source_width, source_height, width, height, "rasterized image on canvas");
        Ok(RawImage::new(
            image_data.width(),
            image_data.height(),
            image_data.data().0,
        )?)
    }
}

impl CanvasBackend for CanvasDecoder {
    type Source = BrowserSource;

    async fn decode(
        &self,
        input: CanvasInput<BrowserSource>,
        options: &DecodeOptions,
    ) -> Result<RawImage, PixelError> {
        self.rasterize(&input, options)
            .await
            .map_err(|failure| match failure {
                CanvasFailure::Classified(err) => err,
                CanvasFailure::Js(value) => {
                    let err = PixelError::decode_failed("Image processing failed")
                        .with_cause(JsFailure::from(value));
                    match &input {
                        CanvasInput::Url(url) => err
                            .with_detail("sourceType", "string")
                            .with_detail("sourceURL", url),
                        CanvasInput::Object(source) => {
                            err.with_detail("sourceType", source.type_name())
                        }
                    }
                }
            })
    }
}

async fn bitmap_from_url(url: &str) -> Result<ImageBitmap, CanvasFailure> {
    let response = fetch_response(url).await.map_err(|err| {
        network_error("Failed to fetch image", url).with_cause(JsFailure::from(err))
    })?;
    if !response.ok() {
        let status = response.status();
        return Err(network_error(format!("Image fetch failed (HTTP {status})"), url)
            .with_detail("status", status)
            .with_cause(JsFailure::new(response.status_text()))
            .into());
    }

    let blob = JsFuture::from(response.blob()?).await?.dyn_into::<Blob>()?;
    let mime_type = blob.type_();
    if is_svg(&mime_type, url) {
        return svg_to_bitmap(&blob, Some(url)).await;
    }
    create_image_bitmap(&blob).await.map_err(|err| {
        let format = if mime_type.is_empty() { "unknown" } else { mime_type.as_str() };
        PixelError::decode_failed(format!("Failed to decode {format} image"))
            .with_detail("sourceURL", url)
            .with_detail("mimeType", &mime_type)
            .with_cause(JsFailure::from(err))
            .into()
    })
}

fn network_error(message: impl Into<String>, url: &str) -> PixelError {
    PixelError::network(message)
        .with_detail("url", url)
        .with_detail("sourceURL", url)
}

async fn bitmap_from_object(source: &BrowserSource) -> Result<ImageBitmap, CanvasFailure> {
    if let Some(blob) = source.value().dyn_ref::<Blob>() {
        if blob.type_().eq_ignore_ascii_case(SVG_MIME_TYPE) {
            return svg_to_bitmap(blob, None).await;
        }
    }
    create_image_bitmap(source.value()).await.map_err(|err| {
        PixelError::decode_failed("Failed to process image source")
            .with_detail("sourceType", source.type_name())
            .with_cause(JsFailure::from(err))
            .into()
    })
}

/// Returns true for the SVG MIME type or a URL path ending in `.svg`.
fn is_svg(mime_type: &str, url: &str) -> bool {
    if mime_type.eq_ignore_ascii_case(SVG_MIME_TYPE) {
        return true;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.get(path.len().saturating_sub(4)..)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(".svg"))
}

async fn svg_to_bitmap(blob: &Blob, source_url: Option<&str>) -> Result<ImageBitmap, CanvasFailure> {
    rasterize_svg(blob, source_url)
        .await
        .map_err(|failure| match failure {
            classified @ CanvasFailure::Classified(_) => classified,
            CanvasFailure::Js(value) => {
                let err = PixelError::decode_failed("Failed to process SVG image")
                    .with_detail("mimeType", SVG_MIME_TYPE)
                    .with_cause(JsFailure::from(value));
                CanvasFailure::Classified(match source_url {
                    Some(url) => err.with_detail("sourceURL", url),
                    None => err,
                })
            }
        })
}

async fn rasterize_svg(blob: &Blob, source_url: Option<&str>) -> Result<ImageBitmap, CanvasFailure> {
    let object_url = ObjectUrl::new(blob)?;
    let source_url = source_url.unwrap_or(&object_url.0);

    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some("anonymous"));
    image.set_src(&object_url.0);
    JsFuture::from(image.decode()).await.map_err(|err| {
        PixelError::file_read("Failed to load image from URL")
            .with_detail("sourceURL", source_url)
            .with_cause(JsFailure::from(err))
    })?;

    let (width, height) = (image.natural_width(), image.natural_height());
    if width == 0 || height == 0 {
        return Err(PixelError::decode_failed(format!(
            "Invalid SVG dimensions (width: {width}, height: {height})"
        ))
        .with_detail("width", width)
        .with_detail("height", height)
        .with_detail("sourceURL", source_url)
        .into());
    }

    let canvas = OffscreenCanvas::new(width, height)?;
    let context = rendering_context(&canvas)?;
    context.set_image_smoothing_enabled(false);
    context.draw_image_with_html_image_element(&image, 0.0, 0.0)?;
    debug!(width, height, "rasterized SVG document");
    Ok(create_image_bitmap(&canvas).await?)
}

async fn create_image_bitmap(source: &JsValue) -> Result<ImageBitmap, JsValue> {
    call_global("createImageBitmap", source)
        .await?
        .dyn_into::<ImageBitmap>()
}

fn rendering_context(
    canvas: &OffscreenCanvas,
) -> Result<OffscreenCanvasRenderingContext2d, CanvasFailure> {
    let settings = Object::new();
    Reflect::set(&settings, &"alpha".into(), &JsValue::TRUE)?;
    Reflect::set(&settings, &"colorSpace".into(), &"srgb".into())?;
    Reflect::set(&settings, &"willReadFrequently".into(), &JsValue::TRUE)?;

    let context = canvas
        .get_context_with_context_options("2d", &settings)?
        .ok_or_else(|| PixelError::decode_failed("Failed to get canvas context"))?;
    let context = context
        .dyn_into::<OffscreenCanvasRenderingContext2d>()
        .map_err(JsValue::from)?;
    Ok(context)
}
