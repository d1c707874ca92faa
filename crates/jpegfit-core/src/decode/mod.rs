//! Image decoding for jpegfit.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG, BMP and TIFF input files
//! - Applying EXIF orientation so re-encoded output is upright
//! - Describing decoded pixels with their original color mode
//!
//! # Examples
//!
//! ```ignore
//! use jpegfit_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} {} image", image.width, image.height, image.mode.name());
//! ```

mod reader;
mod types;

pub use reader::{decode_image, decode_orientation};
pub use types::{ColorMode, DecodeError, Orientation, SourceImage};
