//! The `pixelite` entry point.
//!
//! # Example
//!
//! ```typescript
//! import { pixelite } from '@pixelite/wasm';
//!
//! const image = await pixelite('https://example.com/photo.png', { width: 64 });
//! console.log(`${image.width}x${image.height}, ${image.data.length} bytes`);
//! ```

use pixelite_core::{DecodeOptions, Dispatcher};
use wasm_bindgen::prelude::*;

use crate::canvas::CanvasDecoder;
use crate::env::detect_environment;
use crate::error::{dispatch_error_to_js, type_error};
use crate::source::{classify, BrowserLoader};
use crate::types::JsPixelData;

/// The dispatcher used by [`pixelite`]: native decoding under Node.js,
/// canvas decoding in browsers and workers.
pub fn dispatcher() -> Dispatcher<BrowserLoader, CanvasDecoder> {
    Dispatcher::new(BrowserLoader::new(), CanvasDecoder::new()).with_probe(detect_environment)
}

/// Decode an image into RGBA pixels.
///
/// # Arguments
///
/// * `input` - A URL or path string, a `URL`, an `ArrayBuffer` or typed view,
///   or (in browsers) an image-like platform object such as a `Blob`,
///   `HTMLImageElement` or `ImageBitmap`
/// * `options` - Optional `{ width?, height? }`
///
/// # Errors
///
/// Rejects with a `TypeError` for inputs that do not fit the current
/// environment or unreadable options, and with a `PixeliteError` otherwise.
#[wasm_bindgen]
pub async fn pixelite(input: JsValue, options: JsValue) -> Result<JsPixelData, JsValue> {
    let options = parse_options(options)?;
    dispatcher()
        .decode(classify(input), &options)
        .await
        .map(JsPixelData::from_raw)
        .map_err(|e| dispatch_error_to_js(&e))
}

fn parse_options(options: JsValue) -> Result<DecodeOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(DecodeOptions::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| type_error(&format!("Invalid decode options: {e}")))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::{Reflect, Uint8Array};
    use pixelite_core::Environment;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_parse_options() {
        assert_eq!(parse_options(JsValue::UNDEFINED).unwrap(), DecodeOptions::new());

        let value = js_sys::Object::new();
        Reflect::set(&value, &"width".into(), &JsValue::from_f64(32.0)).unwrap();
        let options = parse_options(value.into()).unwrap();
        assert_eq!(options.width, Some(32));
        assert_eq!(options.height, None);

        assert!(parse_options(JsValue::from_str("big")).is_err());
    }

    #[wasm_bindgen_test]
    fn test_dispatcher_probes_browser() {
        assert_eq!(dispatcher().environment(), Environment::Browser);
    }

    #[wasm_bindgen_test]
    async fn test_buffers_rejected_in_browser() {
        let bytes: JsValue = Uint8Array::from(&[1u8, 2, 3][..]).into();
        let err = pixelite(bytes, JsValue::UNDEFINED).await.unwrap_err();
        assert!(err.is_instance_of::<js_sys::TypeError>());
        let message = err.dyn_ref::<js_sys::Error>().unwrap().message();
        assert_eq!(
            String::from(message),
            "Invalid input type for browser environment: Uint8Array"
        );
    }
}
