//! Runtime environment detection for JavaScript hosts.

use js_sys::Reflect;
use pixelite_core::Environment;
use wasm_bindgen::JsValue;

/// Report [`Environment::Native`] under Node.js and [`Environment::Browser`]
/// everywhere else.
///
/// The check looks for `process.versions.node` on the global object and is
/// repeated on every call.
pub fn detect_environment() -> Environment {
    if node_version().is_some() {
        Environment::Native
    } else {
        Environment::Browser
    }
}

/// The `process.versions.node` string, if present.
pub fn node_version() -> Option<String> {
    let process = property(&js_sys::global(), "process")?;
    let versions = property(&process, "versions")?;
    property(&versions, "node")?.as_string()
}

/// Read `key` from `target`, treating `undefined` and `null` as absent.
pub(crate) fn property(target: &JsValue, key: &str) -> Option<JsValue> {
    if !target.is_object() && !target.is_function() {
        return None;
    }
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}
