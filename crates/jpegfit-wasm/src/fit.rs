//! Size-fitting compression WASM bindings.
//!
//! # Functions
//!
//! - [`compress_to_budget`] - Decode an image file and fit it under a byte budget
//! - [`compress_pixels_to_budget`] - Fit raw canvas pixels under a byte budget
//! - [`default_target`] - The default target as a plain JS object
//!
//! Targets are plain objects with the same field names as
//! `jpegfit_core::CompressionTarget`; missing fields take their defaults.
//!
//! ```typescript
//! const ctx = canvas.getContext('2d');
//! const { data } = ctx.getImageData(0, 0, canvas.width, canvas.height);
//! const result = compress_pixels_to_budget(data, canvas.width, canvas.height, 4, {
//!   max_bytes: 200_000,
//! });
//! if (!result.met_budget) {
//!   console.warn(`still ${result.byte_length} bytes`);
//! }
//! ```

use crate::types::JsFitResult;
use jpegfit_core::{decode_image, ColorMode, CompressionResult, CompressionTarget, SourceImage};
use wasm_bindgen::prelude::*;

/// Decode `bytes` (JPEG, PNG, BMP or TIFF) and compress it under `target`.
///
/// `target` may be `undefined` or `null` for the default 1 MiB budget.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded, the color mode cannot be
/// represented as JPEG, the target is invalid, or no encode attempt succeeded.
/// Missing the budget is not an error; check `met_budget`.
#[wasm_bindgen]
pub fn compress_to_budget(bytes: &[u8], target: JsValue) -> Result<JsFitResult, JsValue> {
    let target = parse_target(target)?;
    let result = fit_bytes(bytes, &target).map_err(|e| JsValue::from_str(&e))?;
    Ok(finish(result, &target))
}

/// Compress raw pixels under `target`.
///
/// `channels` selects the layout: 1 = gray, 2 = gray + alpha, 3 = RGB,
/// 4 = RGBA (as returned by `getImageData`). Alpha is dropped.
#[wasm_bindgen]
pub fn compress_pixels_to_budget(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    target: JsValue,
) -> Result<JsFitResult, JsValue> {
    let target = parse_target(target)?;
    let result = fit_pixels(pixels, width, height, channels, &target)
        .map_err(|e| JsValue::from_str(&e))?;
    Ok(finish(result, &target))
}

/// The default compression target.
#[wasm_bindgen]
pub fn default_target() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&CompressionTarget::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_target(value: JsValue) -> Result<CompressionTarget, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(CompressionTarget::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid target: {}", e)))
}

fn finish(result: CompressionResult, target: &CompressionTarget) -> JsFitResult {
    if !result.met_budget {
        web_sys::console::warn_1(&JsValue::from_str(&over_budget_message(&result, target)));
    }
    JsFitResult::from(result)
}

fn over_budget_message(result: &CompressionResult, target: &CompressionTarget) -> String {
    format!(
        "jpegfit: could not reach {} bytes; returning {} bytes at quality {} ({}x{})",
        target.max_bytes,
        result.len(),
        result.quality,
        result.width,
        result.height
    )
}

fn fit_bytes(bytes: &[u8], target: &CompressionTarget) -> Result<CompressionResult, String> {
    let image = decode_image(bytes).map_err(|e| e.to_string())?;
    jpegfit_core::compress_to_budget(image, target).map_err(|e| e.to_string())
}

fn fit_pixels(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    target: &CompressionTarget,
) -> Result<CompressionResult, String> {
    let image = source_from_pixels(pixels, width, height, channels)?;
    jpegfit_core::compress_to_budget(image, target).map_err(|e| e.to_string())
}

fn source_from_pixels(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
) -> Result<SourceImage, String> {
    let mode = match channels {
        1 => ColorMode::Gray,
        2 => ColorMode::GrayAlpha,
        3 => ColorMode::Rgb,
        4 => ColorMode::Rgba,
        n => return Err(format!("Unsupported channel count: {} (expected 1-4)", n)),
    };
    Ok(SourceImage::new(width, height, mode, pixels))
}


/// WASM-specific tests that require JsValue. Run with `wasm-pack test`.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde::Serialize;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Serialize)]
    struct PartialTarget {
        max_bytes: u64,
    }

    #[wasm_bindgen_test]
    fn test_undefined_target_is_default() {
        let target = parse_target(JsValue::UNDEFINED).unwrap();
        assert_eq!(target, CompressionTarget::default());
    }

    #[wasm_bindgen_test]
    fn test_partial_target_fills_defaults() {
        let js = serde_wasm_bindgen::to_value(&PartialTarget { max_bytes: 2048 }).unwrap();
        let target = parse_target(js).unwrap();
        assert_eq!(target.max_bytes, 2048);
        assert_eq!(target.start_quality, 95);
    }

    #[wasm_bindgen_test]
    fn test_default_target_round_trips() {
        let js = default_target().unwrap();
        assert_eq!(parse_target(js).unwrap(), CompressionTarget::default());
    }

    #[wasm_bindgen_test]
    fn test_compress_pixels_to_budget() {
        let pixels = vec![200u8; 16 * 16 * 4];
        let result = compress_pixels_to_budget(pixels, 16, 16, 4, JsValue::NULL).unwrap();
        assert!(result.met_budget());
        assert_eq!(result.width(), 16);
        assert!(result.byte_length() > 0);

        let log = result.attempt_log().unwrap();
        assert!(js_sys::Array::is_array(&log));
        assert_eq!(js_sys::Array::from(&log).length() as usize, result.attempts());
    }

    #[wasm_bindgen_test]
    fn test_bad_channel_count_is_error() {
        assert!(compress_pixels_to_budget(vec![0; 5], 1, 1, 5, JsValue::UNDEFINED).is_err());
    }
}
