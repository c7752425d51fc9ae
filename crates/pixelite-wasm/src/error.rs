//! Conversion of classified errors into JavaScript exceptions.
//!
//! A [`PixelError`] becomes an `Error` named `PixeliteError` with `code`,
//! `details` (a plain object) and `cause` properties. An input of the wrong
//! type for the current environment becomes a `TypeError`.

use js_sys::{Error, Object, Reflect, TypeError};
use pixelite_core::{DispatchError, PixelError};
use serde::Serialize;
use thiserror::Error as ThisError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Name given to every classified error thrown into JavaScript.
pub const ERROR_NAME: &str = "PixeliteError";

/// A JavaScript exception carried through Rust error chains.
///
/// `JsValue` is neither `Send` nor `Error`, so only its message is kept.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{0}")]
pub struct JsFailure(String);

impl JsFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<JsValue> for JsFailure {
    fn from(value: JsValue) -> Self {
        if let Some(error) = value.dyn_ref::<Error>() {
            return Self(String::from(error.message()));
        }
        match value.as_string() {
            Some(message) => Self(message),
            None => Self(format!("{value:?}")),
        }
    }
}

/// Convert a classified error into a `PixeliteError` exception.
pub fn pixel_error_to_js(err: &PixelError) -> JsValue {
    let error = Error::new(err.message());
    error.set_name(ERROR_NAME);
    set_property(&error, "code", &JsValue::from_str(err.code()));
    set_property(&error, "details", &details_to_js(err));
    if let Some(cause) = err.cause() {
        set_property(&error, "cause", &Error::new(&cause.to_string()));
    }
    error.into()
}

/// Convert a dispatch failure into the exception thrown by `pixelite`.
pub fn dispatch_error_to_js(err: &DispatchError) -> JsValue {
    match err {
        DispatchError::Pixel(err) => pixel_error_to_js(err),
        DispatchError::InvalidInputType { .. } => {
            let error = TypeError::new(&err.to_string());
            set_property(&error, "cause", &Error::new("Invalid input type"));
            error.into()
        }
    }
}

/// A `TypeError` for arguments that could not be read at all.
pub fn type_error(message: &str) -> JsValue {
    TypeError::new(message).into()
}

fn details_to_js(err: &PixelError) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    err.details()
        .serialize(&serializer)
        .unwrap_or_else(|_| Object::new().into())
}

fn set_property(target: &JsValue, key: &str, value: &JsValue) {
    // Only fails on frozen objects, which freshly created errors never are.
    let _ = Reflect::set(target, &JsValue::from_str(key), value);
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use pixelite_core::Environment;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn get(target: &JsValue, key: &str) -> JsValue {
        Reflect::get(target, &JsValue::from_str(key)).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_pixel_error_shape() {
        let err = PixelError::network("Failed to fetch image from URL")
            .with_detail("url", "https://example.com/a.png")
            .with_detail("status", 404)
            .with_cause(JsFailure::new("Not Found"));
        let value = pixel_error_to_js(&err);

        let error = value.dyn_ref::<Error>().unwrap();
        assert_eq!(String::from(error.name()), ERROR_NAME);
        assert_eq!(String::from(error.message()), "Failed to fetch image from URL");
        assert_eq!(get(&value, "code").as_string().as_deref(), Some("NETWORK_ERROR"));

        let details = get(&value, "details");
        assert_eq!(
            get(&details, "url").as_string().as_deref(),
            Some("https://example.com/a.png")
        );
        assert_eq!(get(&details, "status").as_string().as_deref(), Some("404"));

        let cause = get(&value, "cause");
        assert_eq!(
            String::from(cause.dyn_ref::<Error>().unwrap().message()),
            "Not Found"
        );
    }

    #[wasm_bindgen_test]
    fn test_invalid_input_is_type_error() {
        let err = DispatchError::InvalidInputType {
            environment: Environment::Browser,
            type_name: "Uint8Array".to_string(),
        };
        let value = dispatch_error_to_js(&err);
        assert!(value.is_instance_of::<TypeError>());
        assert_eq!(
            String::from(value.dyn_ref::<Error>().unwrap().message()),
            "Invalid input type for browser environment: Uint8Array"
        );
    }

    #[wasm_bindgen_test]
    fn test_js_failure_from_values() {
        let from_error = JsFailure::from(JsValue::from(Error::new("boom")));
        assert_eq!(from_error.message(), "boom");
        let from_string = JsFailure::from(JsValue::from_str("plain"));
        assert_eq!(from_string.message(), "plain");
    }
}
