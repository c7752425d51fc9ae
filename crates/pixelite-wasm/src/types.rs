//! WASM-compatible wrapper types for decoded pixel data.

use pixelite_core::{RawImage, WordLayout};
use wasm_bindgen::prelude::*;

use crate::error::pixel_error_to_js;
use crate::transcode::words_to_js;

/// Decoded RGBA pixels returned to JavaScript.
///
/// # Memory Management
///
/// The pixel data lives in WASM memory. Reading `data` copies it into a
/// JavaScript `Uint8Array`, so hold on to that copy rather than reading the
/// getter repeatedly.
///
/// `free()` releases the WASM memory early; wasm-bindgen's finalizer will
/// otherwise do it.
#[wasm_bindgen]
pub struct JsPixelData {
    image: RawImage,
}

#[wasm_bindgen]
impl JsPixelData {
    /// Image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.image.width
    }

    /// Image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// Channels per pixel, always 4
    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u8 {
        self.image.channels
    }

    /// RGBA bytes in row-major order, as a `Uint8Array` copy.
    #[wasm_bindgen(getter)]
    pub fn data(&self) -> Vec<u8> {
        self.image.data.clone()
    }

    /// Number of bytes in `data` (width * height * 4)
    #[wasm_bindgen(getter, js_name = byteLength)]
    pub fn byte_length(&self) -> usize {
        self.image.data.len()
    }

    /// The pixels as `0xAARRGGBB` words, in a plain array or, with
    /// `use_typed_array`, a `Uint32Array`.
    pub fn words(&self, use_typed_array: Option<bool>) -> Result<JsValue, JsValue> {
        let layout = if use_typed_array.unwrap_or(false) {
            WordLayout::FixedWidth
        } else {
            WordLayout::Sequence
        };
        self.image
            .to_words(layout)
            .map(|words| words_to_js(&words))
            .map_err(|e| pixel_error_to_js(&e))
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsPixelData {
    pub(crate) fn from_raw(image: RawImage) -> Self {
        Self { image }
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::{Array, Uint32Array};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_words_layouts() {
        let js = JsPixelData::from_raw(RawImage::new(1, 1, vec![0x11, 0x22, 0x33, 0x44]).unwrap());

        let typed = js.words(Some(true)).unwrap().dyn_into::<Uint32Array>().unwrap();
        assert_eq!(typed.to_vec(), vec![0x4411_2233]);

        let plain = js.words(None).unwrap().dyn_into::<Array>().unwrap();
        assert_eq!(plain.get(0).as_f64(), Some(f64::from(0x4411_2233u32)));
    }
}
