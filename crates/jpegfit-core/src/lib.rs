//! jpegfit core - fit images under a JPEG byte budget
//!
//! This crate provides the size-fitting compressor and everything around it:
//! decoding input files, normalizing color modes for JPEG, encoding, resizing,
//! and a folder-level batch driver.
//!
//! The search lowers JPEG quality at native resolution first and only
//! downscales when quality alone cannot reach the budget. See [`fit`].

pub mod batch;
pub mod decode;
pub mod encode;
pub mod fit;
pub mod flatten;
pub mod resize;

pub use batch::{compress_folder, BatchError, BatchOptions, BatchReport, FileOutcome, FileStatus};
pub use decode::{decode_image, ColorMode, DecodeError, SourceImage};
pub use encode::{encode_jpeg, EncodeError, EncodeParams, JpegCodec, JpegEncoderCodec};
pub use fit::{
    compress_to_budget, AttemptOutcome, CompressionAttempt, CompressionResult, CompressionTarget,
    FitError, Phase, SizeFittingCompressor, DEFAULT_MAX_BYTES,
};
pub use flatten::{flatten, FlatImage, FlattenError, PixelLayout};
pub use resize::{FilterType, ResizeError};
