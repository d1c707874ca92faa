//! jpegfit WASM - WebAssembly bindings for jpegfit
//!
//! This crate exposes the jpegfit-core size-fitting compressor to
//! JavaScript/TypeScript applications, e.g. to shrink an upload in the
//! browser before sending it.
//!
//! # Module Structure
//!
//! - `fit` - Compression bindings (encoded files and raw canvas pixels)
//! - `types` - WASM-compatible wrapper for the compression result
//!
//! # Usage
//!
//! ```typescript
//! import init, { compress_to_budget } from '@jpegfit/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = compress_to_budget(bytes, { max_bytes: 500_000 });
//! console.log(`${result.width}x${result.height} at q${result.quality}`);
//! ```

use wasm_bindgen::prelude::*;

mod fit;
mod types;

pub use fit::{compress_pixels_to_budget, compress_to_budget, default_target};
pub use types::JsFitResult;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
