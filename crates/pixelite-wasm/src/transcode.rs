//! Pixel transcoding WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { pack_pixels, unpack_pixels } from '@pixelite/wasm';
//!
//! const words = unpack_pixels(new Uint8Array([255, 0, 0, 0, 255, 0]));
//! // [0xFFFF0000, 0xFF00FF00]
//! const rgba = pack_pixels(words);
//! // Uint8Array [255, 0, 0, 255, 0, 255, 0, 255]
//! ```

use js_sys::{Array, Uint32Array};
use pixelite_core::{
    resolve_in_memory, unpack, BytesPerPixel, PixelError, PixelWords, Resolution, UnpackOptions,
    WordLayout,
};
use wasm_bindgen::prelude::*;

use crate::error::{pixel_error_to_js, type_error};
use crate::source::{buffer_source, type_name};

/// Pack `0xAARRGGBB` words into an RGBA byte buffer.
///
/// Each number is first converted to an unsigned 32-bit integer the way
/// JavaScript's `>>> 0` does.
#[wasm_bindgen]
pub fn pack_pixels(words: &[f64]) -> Vec<u8> {
    pixelite_core::pack(words)
}

/// Unpack an RGB or RGBA byte buffer into `0xAARRGGBB` words.
///
/// # Arguments
///
/// * `buffer` - An `ArrayBuffer` or any `ArrayBufferView`, read by byte
///   offset and byte length
/// * `bytes_per_pixel` - 3 or 4; detected from the buffer length when omitted
/// * `use_typed_array` - Return a `Uint32Array` instead of a plain array
///
/// # Errors
///
/// Throws a `TypeError` if `buffer` is not a buffer, and a `PixeliteError`
/// with code `DECODE_FAILED` if the length does not fit the pixel size.
#[wasm_bindgen]
pub fn unpack_pixels(
    buffer: JsValue,
    bytes_per_pixel: Option<u8>,
    use_typed_array: Option<bool>,
) -> Result<JsValue, JsValue> {
    let source = buffer_source(&buffer).ok_or_else(|| {
        type_error(&format!(
            "unpack_pixels expects an ArrayBuffer or ArrayBufferView, got {}",
            type_name(&buffer)
        ))
    })?;
    let bytes = match resolve_in_memory(source).map_err(|e| pixel_error_to_js(&e))? {
        Resolution::Resolved(bytes) => bytes,
        Resolution::Deferred(_) => return Err(type_error("unpack_pixels expects a buffer")),
    };

    let options = unpack_options(bytes_per_pixel, use_typed_array.unwrap_or(false))
        .map_err(|e| pixel_error_to_js(&e))?;
    let words = unpack(&bytes, options).map_err(|e| pixel_error_to_js(&e))?;
    Ok(words_to_js(&words))
}

fn unpack_options(
    bytes_per_pixel: Option<u8>,
    use_typed_array: bool,
) -> Result<UnpackOptions, PixelError> {
    let layout = if use_typed_array {
        WordLayout::FixedWidth
    } else {
        WordLayout::Sequence
    };
    let options = UnpackOptions::new().layout(layout);
    match bytes_per_pixel {
        Some(bpp) => Ok(options.bytes_per_pixel(BytesPerPixel::try_from(bpp)?)),
        None => Ok(options),
    }
}

pub(crate) fn words_to_js(words: &PixelWords) -> JsValue {
    match words {
        PixelWords::FixedWidth(words) => Uint32Array::from(&words[..]).into(),
        PixelWords::Sequence(words) => words
            .iter()
            .map(|&word| JsValue::from_f64(f64::from(word)))
            .collect::<Array>()
            .into(),
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::{ArrayBuffer, Reflect, Uint8Array};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn bytes(data: &[u8]) -> JsValue {
        Uint8Array::from(data).into()
    }

    #[wasm_bindgen_test]
    fn test_unpack_rgb_to_array() {
        let words = unpack_pixels(bytes(&[255, 0, 0, 0, 255, 0]), None, None).unwrap();
        let array = words.dyn_into::<Array>().unwrap();
        assert_eq!(array.length(), 2);
        assert_eq!(array.get(0).as_f64(), Some(4294901760.0));
        assert_eq!(array.get(1).as_f64(), Some(4278255360.0));
    }

    #[wasm_bindgen_test]
    fn test_unpack_to_typed_array() {
        let words = unpack_pixels(bytes(&[1, 2, 3, 4]), Some(4), Some(true)).unwrap();
        let array = words.dyn_into::<Uint32Array>().unwrap();
        assert_eq!(array.to_vec(), vec![0x0401_0203]);
    }

    #[wasm_bindgen_test]
    fn test_unpack_view_window() {
        let backing = Uint8Array::from(&[9u8, 9, 1, 2, 3, 9][..]);
        let view = Uint8Array::new_with_byte_offset_and_length(&backing.buffer(), 2, 3);
        let words = unpack_pixels(view.into(), None, Some(true)).unwrap();
        assert_eq!(words.dyn_into::<Uint32Array>().unwrap().to_vec(), vec![0xFF01_0203]);
    }

    #[wasm_bindgen_test]
    fn test_unpack_array_buffer() {
        let buffer: ArrayBuffer = Uint8Array::from(&[1u8, 2, 3][..]).buffer();
        let words = unpack_pixels(buffer.into(), Some(3), Some(true)).unwrap();
        assert_eq!(words.dyn_into::<Uint32Array>().unwrap().to_vec(), vec![0xFF01_0203]);
    }

    #[wasm_bindgen_test]
    fn test_unpack_ambiguous_length_throws() {
        let err = unpack_pixels(bytes(&[0; 5]), None, None).unwrap_err();
        let code = Reflect::get(&err, &"code".into()).unwrap();
        assert_eq!(code.as_string().as_deref(), Some("DECODE_FAILED"));
    }

    #[wasm_bindgen_test]
    fn test_unpack_rejects_non_buffers() {
        let err = unpack_pixels(JsValue::from_str("abc"), None, None).unwrap_err();
        assert!(err.is_instance_of::<js_sys::TypeError>());
    }

    #[wasm_bindgen_test]
    fn test_pack_unpack_identity() {
        let rgba = [10u8, 20, 30, 40, 50, 60, 70, 80];
        let words = unpack_pixels(bytes(&rgba), Some(4), Some(true))
            .unwrap()
            .dyn_into::<Uint32Array>()
            .unwrap();
        let packed: Vec<f64> = words.to_vec().into_iter().map(f64::from).collect();
        assert_eq!(pack_pixels(&packed), rgba.to_vec());
    }
}
