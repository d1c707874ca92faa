//! WASM-compatible wrapper for compression results.

use jpegfit_core::{CompressionAttempt, CompressionResult};
use wasm_bindgen::prelude::*;

/// Outcome of a budget fit, exposed to JavaScript.
///
/// `bytes` is always a complete JPEG stream. When `met_budget` is false it is
/// the smallest-quality encode the search produced and is still larger than
/// the requested budget.
#[wasm_bindgen]
pub struct JsFitResult {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    quality: u8,
    met_budget: bool,
    original_width: u32,
    original_height: u32,
    attempts: Vec<CompressionAttempt>,
}

#[wasm_bindgen]
impl JsFitResult {
    /// JPEG bytes as a `Uint8Array` (copied out of WASM memory).
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// JPEG quality used for `bytes`.
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    #[wasm_bindgen(getter)]
    pub fn met_budget(&self) -> bool {
        self.met_budget
    }

    /// Whether the image had to be downscaled.
    #[wasm_bindgen(getter)]
    pub fn resized(&self) -> bool {
        (self.width, self.height) != (self.original_width, self.original_height)
    }

    /// Number of encode attempts made, including failed ones.
    #[wasm_bindgen(getter)]
    pub fn attempts(&self) -> usize {
        self.attempts.len()
    }

    /// Size of `bytes`, without copying them.
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// Every attempt as an array of `{ phase, quality, width, height, outcome }`.
    pub fn attempt_log(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.attempts).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Explicitly free WASM memory.
    ///
    /// Optional; wasm-bindgen's finalizer releases it otherwise.
    pub fn free(self) {}
}

impl From<CompressionResult> for JsFitResult {
    fn from(result: CompressionResult) -> Self {
        Self {
            bytes: result.bytes,
            width: result.width,
            height: result.height,
            quality: result.quality,
            met_budget: result.met_budget,
            original_width: result.original_width,
            original_height: result.original_height,
            attempts: result.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jpegfit_core::{AttemptOutcome, Phase};

    fn result(width: u32, height: u32) -> CompressionResult {
        CompressionResult {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width,
            height,
            quality: 40,
            met_budget: true,
            phase: Phase::Downscaled,
            original_width: 800,
            original_height: 600,
            attempts: vec![
                CompressionAttempt {
                    phase: Phase::Native,
                    quality: 95,
                    width: 800,
                    height: 600,
                    outcome: AttemptOutcome::Failed("boom".into()),
                },
                CompressionAttempt {
                    phase: Phase::Downscaled,
                    quality: 40,
                    width,
                    height,
                    outcome: AttemptOutcome::Encoded(4),
                },
            ],
        }
    }

    #[test]
    fn test_from_compression_result() {
        let js = JsFitResult::from(result(400, 300));
        assert_eq!(js.width(), 400);
        assert_eq!(js.height(), 300);
        assert_eq!(js.quality(), 40);
        assert!(js.met_budget());
        assert!(js.resized());
        assert_eq!(js.attempts(), 2);
        assert_eq!(js.byte_length(), 4);
        assert_eq!(js.bytes(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_not_resized_at_native_dimensions() {
        let js = JsFitResult::from(result(800, 600));
        assert!(!js.resized());
    }
}
