//! Color mode normalization ahead of JPEG encoding.
//!
//! JPEG carries neither alpha nor palettes. [`flatten`] resolves both once,
//! before any encode attempt, producing a [`FlatImage`] in one of the two
//! layouts the encoder accepts.

use image::{DynamicImage, GrayAlphaImage, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{ColorMode, SourceImage};

/// Errors that can occur while normalizing a source image.
#[derive(Debug, Error)]
pub enum FlattenError {
    /// The color mode has no faithful conversion to the codec's layouts
    #[error("Unsupported color mode: {0}")]
    UnsupportedColorMode(&'static str),

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// A palette index points past the end of the palette
    #[error("Palette index {index} out of range for a palette of {palette_len} colors")]
    InvalidPaletteIndex { index: u8, palette_len: usize },
}

/// Channel layout of a [`FlatImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    /// 1 byte per pixel, encoded as a grayscale JPEG.
    Luma,
    /// 3 bytes per pixel.
    Rgb,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Luma => 1,
            PixelLayout::Rgb => 3,
        }
    }
}

/// An image in a layout the JPEG encoder accepts directly.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channel layout of `pixels`.
    pub layout: PixelLayout,
    /// Pixel data in row-major order.
    pub pixels: Vec<u8>,
}

impl FlatImage {
    pub fn new(width: u32, height: u32, layout: PixelLayout, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * layout.channels(),
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Normalize a source image to a JPEG-compatible layout.
///
/// | Source       | Result | Rule                               |
/// |--------------|--------|------------------------------------|
/// | `Rgb`        | `Rgb`  | moved as-is                        |
/// | `Gray`       | `Luma` | moved as-is                        |
/// | `Rgba`       | `Rgb`  | alpha dropped, color kept          |
/// | `GrayAlpha`  | `Luma` | alpha dropped                      |
/// | `Palette`    | `Rgb`  | indices resolved through the table |
/// | `Cmyk`       | error  | `UnsupportedColorMode`             |
///
/// Alpha is dropped rather than composited: a fully transparent pixel keeps
/// whatever color it stores.
pub fn flatten(image: SourceImage) -> Result<FlatImage, FlattenError> {
    let SourceImage {
        width,
        height,
        mode,
        pixels,
    } = image;

    if width == 0 || height == 0 {
        return Err(FlattenError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * mode.bytes_per_pixel();
    let actual = pixels.len();
    if actual != expected {
        return Err(FlattenError::InvalidPixelData { expected, actual });
    }

    let (layout, pixels) = match mode {
        ColorMode::Rgb => (PixelLayout::Rgb, pixels),
        ColorMode::Gray => (PixelLayout::Luma, pixels),
        ColorMode::Rgba => {
            let rgba = RgbaImage::from_raw(width, height, pixels)
                .ok_or(FlattenError::InvalidPixelData { expected, actual })?;
            (
                PixelLayout::Rgb,
                DynamicImage::ImageRgba8(rgba).into_rgb8().into_raw(),
            )
        }
        ColorMode::GrayAlpha => {
            let la = GrayAlphaImage::from_raw(width, height, pixels)
                .ok_or(FlattenError::InvalidPixelData { expected, actual })?;
            (
                PixelLayout::Luma,
                DynamicImage::ImageLumaA8(la).into_luma8().into_raw(),
            )
        }
        ColorMode::Palette(palette) => (PixelLayout::Rgb, expand_palette(&pixels, &palette)?),
        ColorMode::Cmyk => return Err(FlattenError::UnsupportedColorMode("CMYK")),
    };

    Ok(FlatImage::new(width, height, layout, pixels))
}

fn expand_palette(indices: &[u8], palette: &[[u8; 3]]) -> Result<Vec<u8>, FlattenError> {
    let mut rgb = Vec::with_capacity(indices.len() * 3);
    for &index in indices {
        let color = palette
            .get(index as usize)
            .ok_or(FlattenError::InvalidPaletteIndex {
                index,
                palette_len: palette.len(),
            })?;
        rgb.extend_from_slice(color);
    }
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_rgb_passthrough() {
        let pixels = vec![1, 2, 3, 4, 5, 6];
        let flat = flatten(SourceImage::rgb(2, 1, pixels.clone())).unwrap();
        assert_eq!(flat.layout, PixelLayout::Rgb);
        assert_eq!(flat.pixels, pixels);
    }

    #[test]
    fn test_flatten_gray_stays_luma() {
        let flat = flatten(SourceImage::new(2, 2, ColorMode::Gray, vec![7; 4])).unwrap();
        assert_eq!(flat.layout, PixelLayout::Luma);
        assert_eq!(flat.pixels, vec![7; 4]);
    }

    #[test]
    fn test_flatten_rgba_drops_alpha() {
        let pixels = vec![
            255, 0, 0, 255, // opaque red
            0, 255, 0, 0, // transparent green
        ];
        let flat = flatten(SourceImage::rgba(2, 1, pixels)).unwrap();
        assert_eq!(flat.layout, PixelLayout::Rgb);
        assert_eq!(flat.pixels, vec![255, 0, 0, 0, 255, 0]);
    }

    #[test]
    fn test_flatten_fully_transparent_rgba() {
        let flat = flatten(SourceImage::rgba(4, 4, vec![0u8; 4 * 4 * 4])).unwrap();
        assert_eq!(flat.layout, PixelLayout::Rgb);
        assert_eq!(flat.pixels.len(), 4 * 4 * 3);
    }

    #[test]
    fn test_flatten_gray_alpha() {
        let image = SourceImage::new(2, 1, ColorMode::GrayAlpha, vec![10, 0, 20, 255]);
        let flat = flatten(image).unwrap();
        assert_eq!(flat.layout, PixelLayout::Luma);
        assert_eq!(flat.pixels, vec![10, 20]);
    }

    #[test]
    fn test_flatten_palette() {
        let palette = vec![[255, 0, 0], [0, 0, 255]];
        let image = SourceImage::new(3, 1, ColorMode::Palette(palette), vec![1, 0, 1]);
        let flat = flatten(image).unwrap();
        assert_eq!(flat.layout, PixelLayout::Rgb);
        assert_eq!(flat.pixels, vec![0, 0, 255, 255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn test_flatten_palette_index_out_of_range() {
        let image = SourceImage::new(2, 1, ColorMode::Palette(vec![[0, 0, 0]]), vec![0, 3]);
        let result = flatten(image);
        assert!(matches!(
            result,
            Err(FlattenError::InvalidPaletteIndex {
                index: 3,
                palette_len: 1
            })
        ));
    }

    #[test]
    fn test_flatten_cmyk_unsupported() {
        let result = flatten(SourceImage::new(1, 1, ColorMode::Cmyk, vec![0; 4]));
        assert!(matches!(result, Err(FlattenError::UnsupportedColorMode("CMYK"))));
    }

    #[test]
    fn test_flatten_zero_dimensions() {
        let result = flatten(SourceImage::rgb(0, 10, vec![]));
        assert!(matches!(result, Err(FlattenError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_flatten_short_buffer() {
        let result = flatten(SourceImage::rgba(10, 10, vec![0u8; 10 * 10 * 3]));
        assert!(matches!(
            result,
            Err(FlattenError::InvalidPixelData {
                expected: 400,
                actual: 300
            })
        ));
    }
}
