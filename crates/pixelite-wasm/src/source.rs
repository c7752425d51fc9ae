//! Classification of JavaScript values into decode inputs, and byte loading
//! through the host's `fetch` and filesystem.

use std::io;

use js_sys::{ArrayBuffer, Function, Promise, Reflect, Uint8Array};
use pixelite_core::{
    BufferView, ByteLoader, ElementType, FetchError, ImageSource, Input, PlatformSource,
};
use tracing::trace;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::env::property;
use crate::error::JsFailure;

/// Platform objects the canvas backend can rasterize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserSourceKind {
    Blob,
    File,
    HtmlImageElement,
    SvgImageElement,
    HtmlVideoElement,
    HtmlCanvasElement,
    OffscreenCanvas,
    ImageBitmap,
    VideoFrame,
    ImageData,
}

impl BrowserSourceKind {
    /// The JavaScript constructor name.
    pub fn name(self) -> &'static str {
        match self {
            BrowserSourceKind::Blob => "Blob",
            BrowserSourceKind::File => "File",
            BrowserSourceKind::HtmlImageElement => "HTMLImageElement",
            BrowserSourceKind::SvgImageElement => "SVGImageElement",
            BrowserSourceKind::HtmlVideoElement => "HTMLVideoElement",
            BrowserSourceKind::HtmlCanvasElement => "HTMLCanvasElement",
            BrowserSourceKind::OffscreenCanvas => "OffscreenCanvas",
            BrowserSourceKind::ImageBitmap => "ImageBitmap",
            BrowserSourceKind::VideoFrame => "VideoFrame",
            BrowserSourceKind::ImageData => "ImageData",
        }
    }

    fn of(value: &JsValue) -> Option<Self> {
        // File before Blob: every File is a Blob.
        let kind = if value.is_instance_of::<web_sys::File>() {
            BrowserSourceKind::File
        } else if value.is_instance_of::<web_sys::Blob>() {
            BrowserSourceKind::Blob
        } else if value.is_instance_of::<web_sys::HtmlImageElement>() {
            BrowserSourceKind::HtmlImageElement
        } else if value.is_instance_of::<web_sys::SvgImageElement>() {
            BrowserSourceKind::SvgImageElement
        } else if value.is_instance_of::<web_sys::HtmlVideoElement>() {
            BrowserSourceKind::HtmlVideoElement
        } else if value.is_instance_of::<web_sys::HtmlCanvasElement>() {
            BrowserSourceKind::HtmlCanvasElement
        } else if value.is_instance_of::<web_sys::OffscreenCanvas>() {
            BrowserSourceKind::OffscreenCanvas
        } else if value.is_instance_of::<web_sys::ImageBitmap>() {
            BrowserSourceKind::ImageBitmap
        } else if value.is_instance_of::<web_sys::ImageData>() {
            BrowserSourceKind::ImageData
        } else if constructor_name(value).as_deref() == Some("VideoFrame") {
            BrowserSourceKind::VideoFrame
        } else {
            return None;
        };
        Some(kind)
    }
}

/// A platform object handed to the canvas backend.
#[derive(Debug, Clone)]
pub struct BrowserSource {
    value: JsValue,
    kind: BrowserSourceKind,
}

impl BrowserSource {
    pub fn kind(&self) -> BrowserSourceKind {
        self.kind
    }

    pub fn value(&self) -> &JsValue {
        &self.value
    }
}

impl PlatformSource for BrowserSource {
    fn type_name(&self) -> &str {
        self.kind.name()
    }
}

/// Sort a JavaScript value into the input the dispatcher routes.
///
/// Strings and `URL` objects become text sources, `ArrayBuffer`s and typed
/// views become buffer sources, and image-like platform objects are kept as
/// they are. Anything else is carried with its type name so that the
/// rejection can name it.
pub fn classify(value: JsValue) -> Input<BrowserSource> {
    if let Some(text) = value.as_string() {
        return Input::Source(ImageSource::Text(text));
    }
    if let Some(url) = value.dyn_ref::<web_sys::Url>() {
        return Input::Source(ImageSource::Text(url.href()));
    }
    if let Some(kind) = BrowserSourceKind::of(&value) {
        trace!(kind = kind.name(), "classified platform object");
        return Input::Platform(BrowserSource { value, kind });
    }
    Input::Source(buffer_source(&value).unwrap_or_else(|| ImageSource::other(type_name(&value))))
}

/// Read an `ArrayBuffer` or typed view into an [`ImageSource`].
///
/// Returns `None` for every other value.
pub fn buffer_source(value: &JsValue) -> Option<ImageSource> {
    if let Some(buffer) = value.dyn_ref::<ArrayBuffer>() {
        return Some(ImageSource::ArrayBuffer(Uint8Array::new(buffer).to_vec().into()));
    }
    if !ArrayBuffer::is_view(value) {
        return None;
    }

    // Only the view's window is copied out of the backing buffer, which may
    // be far larger (a pooled buffer or `WebAssembly.Memory`).
    let buffer = property(value, "buffer")?;
    let byte_offset = property(value, "byteOffset")?.as_f64()? as u32;
    let byte_length = property(value, "byteLength")?.as_f64()? as u32;
    let element = constructor_name(value)
        .and_then(|name| ElementType::from_constructor_name(&name))
        .unwrap_or(ElementType::Uint8);
    let window = Uint8Array::new(&buffer)
        .subarray(byte_offset, byte_offset.saturating_add(byte_length));
    let bytes = window.to_vec();

    trace!(
        constructor = element.constructor_name(),
        byte_offset,
        byte_length,
        copied = bytes.len(),
        "classified typed view"
    );
    Some(ImageSource::View(BufferView::whole(bytes, element)))
}

/// The value's constructor name, or its `typeof` when it has none.
pub fn type_name(value: &JsValue) -> String {
    if value.is_null() {
        return "null".to_string();
    }
    constructor_name(value).unwrap_or_else(|| value.js_typeof().as_string().unwrap_or_default())
}

fn constructor_name(value: &JsValue) -> Option<String> {
    let constructor = property(value, "constructor")?;
    property(&constructor, "name")?
        .as_string()
        .filter(|name| !name.is_empty())
}

/// Call a global function such as `fetch` or `createImageBitmap` and await
/// the promise it returns.
pub(crate) async fn call_global(name: &str, argument: &JsValue) -> Result<JsValue, JsValue> {
    let global = js_sys::global();
    let function = Reflect::get(&global, &JsValue::from_str(name))?.dyn_into::<Function>()?;
    let promise = function.call1(&global, argument)?.dyn_into::<Promise>()?;
    JsFuture::from(promise).await
}

/// `fetch(url)` on the global object.
pub(crate) async fn fetch_response(url: &str) -> Result<Response, JsValue> {
    call_global("fetch", &JsValue::from_str(url))
        .await?
        .dyn_into::<Response>()
}

/// Byte loader backed by the host's global `fetch` and, under Node.js, its
/// `fs` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLoader;

impl BrowserLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ByteLoader for BrowserLoader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = fetch_response(url)
            .await
            .map_err(|err| FetchError::transport(JsFailure::from(err)))?;
        if !response.ok() {
            return Err(FetchError::Status {
                status: response.status(),
                reason: response.status_text(),
            });
        }

        let body = match response.array_buffer() {
            Ok(promise) => JsFuture::from(promise).await,
            Err(err) => Err(err),
        }
        .map_err(|err| FetchError::transport(JsFailure::from(err)))?;
        Ok(Uint8Array::new(&body).to_vec())
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let read_file = node_read_file().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Unsupported,
                "filesystem access is not available in this environment",
            )
        })?;
        let promise = read_file
            .call1(&JsValue::UNDEFINED, &JsValue::from_str(path))
            .and_then(|value| value.dyn_into::<Promise>())
            .map_err(io_error)?;
        let contents = JsFuture::from(promise).await.map_err(io_error)?;
        Ok(Uint8Array::new(&contents).to_vec())
    }
}

/// `fs.promises.readFile` from `process.getBuiltinModule("fs")`.
fn node_read_file() -> Option<Function> {
    let process = property(&js_sys::global(), "process")?;
    let get_builtin = property(&process, "getBuiltinModule")?.dyn_into::<Function>().ok()?;
    let fs = get_builtin
        .call1(&process, &JsValue::from_str("fs"))
        .ok()?;
    let promises = property(&fs, "promises")?;
    let read_file = property(&promises, "readFile")?.dyn_into::<Function>().ok()?;
    Some(read_file.bind(&promises))
}

fn io_error(err: JsValue) -> io::Error {
    let not_found = property(&err, "code").and_then(|code| code.as_string()).as_deref()
        == Some("ENOENT");
    let kind = if not_found {
        io::ErrorKind::NotFound
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, JsFailure::from(err))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::{Object, Uint16Array};
    use pixelite_core::{resolve_in_memory, Resolution};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn resolved(input: Input<BrowserSource>) -> Vec<u8> {
        match input {
            Input::Source(source) => match resolve_in_memory(source).unwrap() {
                Resolution::Resolved(bytes) => bytes.into_vec(),
                Resolution::Deferred(text) => panic!("unexpected text source {text}"),
            },
            Input::Platform(object) => panic!("unexpected platform object {}", object.type_name()),
        }
    }

    #[wasm_bindgen_test]
    fn test_classify_string() {
        let input = classify(JsValue::from_str("https://example.com/a.png"));
        assert!(matches!(input, Input::Source(ImageSource::Text(ref url)) if url == "https://example.com/a.png"));
    }

    #[wasm_bindgen_test]
    fn test_classify_url_object() {
        let url = web_sys::Url::new("https://example.com/b.png").unwrap();
        let input = classify(url.into());
        assert!(matches!(input, Input::Source(ImageSource::Text(ref url)) if url == "https://example.com/b.png"));
    }

    #[wasm_bindgen_test]
    fn test_classify_array_buffer() {
        let bytes = Uint8Array::from(&[1u8, 2, 3][..]);
        assert_eq!(resolved(classify(bytes.buffer().into())), vec![1, 2, 3]);
    }

    #[wasm_bindgen_test]
    fn test_classify_view_uses_byte_window() {
        let backing = Uint8Array::from(&[0u8, 1, 2, 3, 4, 5, 6, 7][..]);
        let view = Uint16Array::new_with_byte_offset_and_length(&backing.buffer(), 2, 2);
        let input = classify(view.into());
        match &input {
            Input::Source(ImageSource::View(view)) => {
                assert_eq!(view.constructor_name(), "Uint16Array");
                assert_eq!(view.byte_length(), 4);
                // Bytes outside the window are never copied
                assert_eq!(view.buffer().len(), 4);
            }
            _ => panic!("expected a typed view"),
        }
        assert_eq!(resolved(input), vec![2, 3, 4, 5]);
    }

    #[wasm_bindgen_test]
    fn test_classify_blob_is_platform_object() {
        let blob = web_sys::Blob::new().unwrap();
        match classify(blob.into()) {
            Input::Platform(object) => assert_eq!(object.kind(), BrowserSourceKind::Blob),
            _ => panic!("expected a platform object"),
        }
    }

    #[wasm_bindgen_test]
    fn test_classify_other_keeps_type_name() {
        let input = classify(JsValue::from_f64(42.0));
        assert!(matches!(input, Input::Source(ImageSource::Other { ref type_name }) if type_name == "number"));
        let input = classify(Object::new().into());
        assert!(matches!(input, Input::Source(ImageSource::Other { ref type_name }) if type_name == "Object"));
    }

    #[wasm_bindgen_test]
    fn test_type_name_of_null_and_undefined() {
        assert_eq!(type_name(&JsValue::NULL), "null");
        assert_eq!(type_name(&JsValue::UNDEFINED), "undefined");
    }

    #[wasm_bindgen_test]
    async fn test_browser_has_no_filesystem() {
        let err = BrowserLoader::new().read_file("image.png").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
