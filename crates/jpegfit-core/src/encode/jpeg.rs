//! JPEG encoding for size-fitting.
//!
//! This module wraps the `jpeg-encoder` crate, which can build optimized
//! Huffman tables per image. The size-fitting search always turns that on:
//! it shaves bytes off every attempt without touching the pixels.

use jpeg_encoder::{ColorType, Encoder};
use thiserror::Error;

use crate::flatten::{FlatImage, PixelLayout};

/// Largest width or height a baseline JPEG frame header can describe.
pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Width or height does not fit in a JPEG frame header
    #[error("Dimensions {width}x{height} exceed the JPEG limit of {MAX_JPEG_DIMENSION} per side")]
    DimensionsTooLarge { width: u32, height: u32 },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Parameters for a single encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    /// JPEG quality (1-100, where 100 is highest quality).
    pub quality: u8,
    /// Build image-specific Huffman tables for a smaller file.
    pub optimize: bool,
}

impl EncodeParams {
    /// Parameters used by the size-fitting search: the given quality with optimization on.
    pub fn optimized(quality: u8) -> Self {
        Self {
            quality,
            optimize: true,
        }
    }
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self::optimized(90)
    }
}

/// Encode a flattened image to JPEG bytes.
///
/// # Arguments
///
/// * `image` - Luma or RGB pixel data with its dimensions
/// * `params` - Quality and Huffman optimization flag
///
/// # Returns
///
/// JPEG-encoded bytes on success, or an error if encoding fails.
///
/// Quality values outside 1-100 are clamped.
pub fn encode_jpeg(image: &FlatImage, params: EncodeParams) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = image.dimensions();

    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    if width > MAX_JPEG_DIMENSION || height > MAX_JPEG_DIMENSION {
        return Err(EncodeError::DimensionsTooLarge { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * image.layout.channels();
    if image.pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: image.pixels.len(),
        });
    }

    let color_type = match image.layout {
        PixelLayout::Luma => ColorType::Luma,
        PixelLayout::Rgb => ColorType::Rgb,
    };

    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer, params.quality.clamp(1, 100));
    encoder.set_optimized_huffman_tables(params.optimize);

    encoder
        .encode(&image.pixels, width as u16, height as u16, color_type)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_rgb(width: u32, height: u32) -> FlatImage {
        FlatImage::new(
            width,
            height,
            PixelLayout::Rgb,
            vec![128u8; (width * height * 3) as usize],
        )
    }

    fn gradient(width: u32, height: u32) -> FlatImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / width) as u8);
                pixels.push((y * 255 / height) as u8);
                pixels.push(((x ^ y) & 0xFF) as u8);
            }
        }
        FlatImage::new(width, height, PixelLayout::Rgb, pixels)
    }

    fn is_jpeg(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && bytes[0..2] == [0xFF, 0xD8] && bytes[bytes.len() - 2..] == [0xFF, 0xD9]
    }

    #[test]
    fn test_encode_jpeg_basic() {
        let jpeg = encode_jpeg(&gray_rgb(100, 100), EncodeParams::default()).unwrap();
        assert!(is_jpeg(&jpeg));
    }

    #[test]
    fn test_encode_jpeg_luma() {
        let image = FlatImage::new(40, 30, PixelLayout::Luma, vec![200u8; 40 * 30]);
        let jpeg = encode_jpeg(&image, EncodeParams::optimized(80)).unwrap();
        assert!(is_jpeg(&jpeg));

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn test_encode_jpeg_decodes_back_to_rgb() {
        let jpeg = encode_jpeg(&gradient(64, 48), EncodeParams::optimized(90)).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();

        assert_eq!((decoded.width(), decoded.height()), (64, 48));
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        let image = gradient(128, 128);

        let low_q = encode_jpeg(&image, EncodeParams::optimized(20)).unwrap();
        let high_q = encode_jpeg(&image, EncodeParams::optimized(95)).unwrap();

        assert!(high_q.len() > low_q.len());
    }

    #[test]
    fn test_encode_jpeg_optimized_tables_not_larger() {
        let image = gradient(128, 128);

        let plain = encode_jpeg(
            &image,
            EncodeParams {
                quality: 85,
                optimize: false,
            },
        )
        .unwrap();
        let optimized = encode_jpeg(&image, EncodeParams::optimized(85)).unwrap();

        assert!(optimized.len() <= plain.len());
    }

    #[test]
    fn test_encode_jpeg_quality_clamping() {
        let image = gray_rgb(10, 10);
        assert!(encode_jpeg(&image, EncodeParams::optimized(0)).is_ok());
        assert!(encode_jpeg(&image, EncodeParams::optimized(255)).is_ok());
    }

    #[test]
    fn test_encode_jpeg_invalid_pixel_data() {
        let image = FlatImage {
            width: 100,
            height: 100,
            layout: PixelLayout::Rgb,
            pixels: vec![128u8; 99 * 100 * 3],
        };
        let result = encode_jpeg(&image, EncodeParams::default());
        assert!(matches!(result, Err(EncodeError::InvalidPixelData { .. })));
    }

    #[test]
    fn test_encode_jpeg_zero_dimensions() {
        let image = FlatImage {
            width: 0,
            height: 100,
            layout: PixelLayout::Rgb,
            pixels: vec![],
        };
        let result = encode_jpeg(&image, EncodeParams::default());
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_encode_jpeg_too_large() {
        let image = FlatImage {
            width: 70_000,
            height: 1,
            layout: PixelLayout::Luma,
            pixels: vec![0u8; 70_000],
        };
        let result = encode_jpeg(&image, EncodeParams::default());
        assert!(matches!(result, Err(EncodeError::DimensionsTooLarge { .. })));
    }

    #[test]
    fn test_encode_jpeg_single_pixel() {
        let image = FlatImage::new(1, 1, PixelLayout::Rgb, vec![255, 0, 0]);
        let jpeg = encode_jpeg(&image, EncodeParams::default()).unwrap();
        assert!(is_jpeg(&jpeg));
    }
}
