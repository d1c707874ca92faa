//! Downscaling for the second phase of the size-fitting search.
//!
//! [`scaled_dimensions`] turns an oversized encode into target dimensions and
//! [`resize`] resamples the full-resolution image to them with the `image`
//! crate's filters.

use image::imageops;
use image::{ImageBuffer, Luma, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flatten::{FlatImage, PixelLayout};

/// Errors that can occur while resizing.
#[derive(Debug, Error)]
pub enum ResizeError {
    /// Target width or height is zero
    #[error("Invalid target dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Source buffer doesn't match its declared dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },
}

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    #[default]
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> imageops::FilterType {
        match self {
            FilterType::Nearest => imageops::FilterType::Nearest,
            FilterType::Bilinear => imageops::FilterType::Triangle,
            FilterType::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Compute downscaled dimensions expected to bring an encode under budget.
///
/// Encoded size is roughly proportional to pixel count, so the linear factor
/// is `sqrt(budget / reference_size)`, shrunk by `safety` to land below the
/// budget rather than just above it. Each side is truncated and kept at 1 or
/// more.
///
/// A ratio at or above 1 would mean the reference already fit; it is capped
/// at 1 so the result never grows. A zero reference size is treated the same
/// way, leaving only the safety shrink.
pub fn scaled_dimensions(
    width: u32,
    height: u32,
    reference_size: usize,
    budget: u64,
    safety: f64,
) -> (u32, u32) {
    let linear = if reference_size == 0 {
        1.0
    } else {
        (budget as f64 / reference_size as f64).sqrt().min(1.0)
    };

    let scale_side = |side: u32| ((side as f64 * linear * safety) as u32).clamp(1, side.max(1));
    (scale_side(width), scale_side(height))
}

/// Resize a flattened image to exact dimensions.
///
/// Returns a new image; the source is only borrowed. Equal dimensions
/// return a clone.
pub fn resize(
    image: &FlatImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<FlatImage, ResizeError> {
    if width == 0 || height == 0 {
        return Err(ResizeError::InvalidDimensions { width, height });
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let expected = (image.width as usize) * (image.height as usize) * image.layout.channels();
    let invalid = || ResizeError::InvalidPixelData {
        expected,
        actual: image.pixels.len(),
    };
    let filter = filter.to_image_filter();

    let pixels = match image.layout {
        PixelLayout::Luma => {
            let view: ImageBuffer<Luma<u8>, &[u8]> =
                ImageBuffer::from_raw(image.width, image.height, image.pixels.as_slice())
                    .ok_or_else(invalid)?;
            imageops::resize(&view, width, height, filter).into_raw()
        }
        PixelLayout::Rgb => {
            let view: ImageBuffer<Rgb<u8>, &[u8]> =
                ImageBuffer::from_raw(image.width, image.height, image.pixels.as_slice())
                    .ok_or_else(invalid)?;
            imageops::resize(&view, width, height, filter).into_raw()
        }
    };

    Ok(FlatImage::new(width, height, image.layout, pixels))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: when the reference exceeds the budget, both sides shrink (down to 1).
        #[test]
        fn prop_scaled_dimensions_shrink(
            width in 2u32..=10_000,
            height in 2u32..=10_000,
            budget in 1u64..=10_000_000,
            excess in 1usize..=50_000_000,
        ) {
            let reference = budget as usize + excess;
            let (w, h) = scaled_dimensions(width, height, reference, budget, 0.9);

            prop_assert!(w >= 1 && h >= 1);
            prop_assert!(w < width);
            prop_assert!(h < height);
        }

        /// Property: resize always produces the requested dimensions and layout.
        #[test]
        fn prop_resize_exact_dimensions(
            (src_w, src_h) in (1u32..=40, 1u32..=40),
            (dst_w, dst_h) in (1u32..=40, 1u32..=40),
            luma in any::<bool>(),
        ) {
            let layout = if luma { PixelLayout::Luma } else { PixelLayout::Rgb };
            let len = (src_w * src_h) as usize * layout.channels();
            let img = FlatImage::new(src_w, src_h, layout, vec![77u8; len]);

            let resized = resize(&img, dst_w, dst_h, FilterType::Lanczos3).unwrap();
            prop_assert_eq!(resized.dimensions(), (dst_w, dst_h));
            prop_assert_eq!(resized.layout, layout);
            prop_assert_eq!(resized.pixels.len(), (dst_w * dst_h) as usize * layout.channels());
        }
    }
}
