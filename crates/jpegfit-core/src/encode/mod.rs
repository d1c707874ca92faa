//! JPEG encoding for jpegfit.
//!
//! [`encode_jpeg`] is the production encoder. [`JpegCodec`] is the seam the
//! size-fitting search encodes through, so the search can be driven by a
//! synthetic codec with scripted output sizes.
//!
//! # Examples
//!
//! ```ignore
//! use jpegfit_core::encode::{encode_jpeg, EncodeParams};
//! use jpegfit_core::flatten::{FlatImage, PixelLayout};
//!
//! let image = FlatImage::new(100, 100, PixelLayout::Rgb, vec![128u8; 100 * 100 * 3]);
//! let jpeg_bytes = encode_jpeg(&image, EncodeParams::optimized(90)).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod jpeg;

pub use jpeg::{encode_jpeg, EncodeError, EncodeParams, MAX_JPEG_DIMENSION};

use crate::flatten::FlatImage;

/// A quality-parameterized JPEG encoder.
pub trait JpegCodec {
    fn encode(&self, image: &FlatImage, params: EncodeParams) -> Result<Vec<u8>, EncodeError>;
}

/// The default codec, backed by [`encode_jpeg`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoderCodec;

impl JpegCodec for JpegEncoderCodec {
    fn encode(&self, image: &FlatImage, params: EncodeParams) -> Result<Vec<u8>, EncodeError> {
        encode_jpeg(image, params)
    }
}

impl<F> JpegCodec for F
where
    F: Fn(&FlatImage, EncodeParams) -> Result<Vec<u8>, EncodeError>,
{
    fn encode(&self, image: &FlatImage, params: EncodeParams) -> Result<Vec<u8>, EncodeError> {
        self(image, params)
    }
}
