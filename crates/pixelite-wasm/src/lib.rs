//! Pixelite WASM - WebAssembly bindings for Pixelite
//!
//! This crate exposes pixelite-core to JavaScript and adds the browser
//! backend: canvas rasterization of platform objects and URL fetching.
//!
//! # Module Structure
//!
//! - `transcode` - `pack_pixels` / `unpack_pixels`
//! - `decode` - The `pixelite` entry point
//! - `source` - Classification of JS values and byte loading through `fetch`
//! - `canvas` - `OffscreenCanvas` decoding backend
//! - `env` - Node.js / browser detection
//! - `error` - `PixeliteError` and `TypeError` conversion
//! - `types` - WASM-compatible wrapper for decoded pixels
//!
//! # Usage
//!
//! ```typescript
//! import init, { pixelite, unpack_pixels } from '@pixelite/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const image = await pixelite(fileInput.files[0], { width: 128, height: 128 });
//! const words = unpack_pixels(image.data, 4, true);
//! ```

use wasm_bindgen::prelude::*;

mod canvas;
mod decode;
mod env;
mod error;
mod source;
mod transcode;
mod types;

// Re-export public types
pub use canvas::CanvasDecoder;
pub use decode::{dispatcher, pixelite};
pub use env::{detect_environment, node_version};
pub use error::{dispatch_error_to_js, pixel_error_to_js, JsFailure, ERROR_NAME};
pub use source::{classify, BrowserLoader, BrowserSource, BrowserSourceKind};
pub use transcode::{pack_pixels, unpack_pixels};
pub use types::JsPixelData;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "pixelite wasm module loaded");
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
