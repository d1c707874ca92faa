//! Core types for decoded source images.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decoder produced a pixel layout that cannot be represented as a source image.
    #[error("Unsupported color mode: {0}")]
    UnsupportedColorMode(String),
}

/// Pixel layout of a decoded source image.
///
/// Every mode stores 8 bits per sample. `Palette` stores one index byte per pixel
/// and carries its RGB lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Single luminance channel.
    Gray,
    /// Luminance plus alpha.
    GrayAlpha,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// One index byte per pixel into an RGB palette.
    Palette(Vec<[u8; 3]>),
    /// Cyan, magenta, yellow, black.
    Cmyk,
}

impl ColorMode {
    /// Number of bytes each pixel occupies in the buffer.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorMode::Gray | ColorMode::Palette(_) => 1,
            ColorMode::GrayAlpha => 2,
            ColorMode::Rgb => 3,
            ColorMode::Rgba | ColorMode::Cmyk => 4,
        }
    }

    /// Short, stable name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Gray => "L",
            ColorMode::GrayAlpha => "LA",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::Palette(_) => "P",
            ColorMode::Cmyk => "CMYK",
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorMode::GrayAlpha | ColorMode::Rgba)
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded image as handed to the size-fitting compressor.
///
/// Unlike the encoder input, the pixel buffer keeps whatever layout the
/// decoder produced; alpha and palette modes are resolved later by
/// [`crate::flatten::flatten`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Layout of `pixels`.
    pub mode: ColorMode,
    /// Pixel data in row-major order, `mode.bytes_per_pixel()` bytes per pixel.
    pub pixels: Vec<u8>,
}

impl SourceImage {
    pub fn new(width: u32, height: u32, mode: ColorMode, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            mode,
            pixels,
        }
    }

    /// Create an RGB source image.
    pub fn rgb(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self::new(width, height, ColorMode::Rgb, pixels)
    }

    /// Create an RGBA source image.
    pub fn rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self::new(width, height, ColorMode::Rgba, pixels)
    }

    /// Buffer length implied by the dimensions and color mode.
    pub fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * self.mode.bytes_per_pixel()
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

impl TryFrom<DynamicImage> for SourceImage {
    type Error = DecodeError;

    /// Keep the decoder's channel layout. 16-bit and float samples are
    /// narrowed to 8 bits; alpha is left for the flattening step.
    fn try_from(img: DynamicImage) -> Result<Self, Self::Error> {
        let (width, height) = (img.width(), img.height());
        let (mode, pixels) = match img {
            DynamicImage::ImageLuma8(buf) => (ColorMode::Gray, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (ColorMode::GrayAlpha, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (ColorMode::Rgb, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (ColorMode::Rgba, buf.into_raw()),
            img @ DynamicImage::ImageLuma16(_) => (ColorMode::Gray, img.into_luma8().into_raw()),
            img @ DynamicImage::ImageLumaA16(_) => {
                (ColorMode::GrayAlpha, img.into_luma_alpha8().into_raw())
            }
            img @ (DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_)) => {
                (ColorMode::Rgb, img.into_rgb8().into_raw())
            }
            img @ (DynamicImage::ImageRgba16(_) | DynamicImage::ImageRgba32F(_)) => {
                (ColorMode::Rgba, img.into_rgba8().into_raw())
            }
            other => {
                return Err(DecodeError::UnsupportedColorMode(format!(
                    "{:?}",
                    other.color()
                )))
            }
        };
        Ok(Self::new(width, height, mode, pixels))
    }
}
