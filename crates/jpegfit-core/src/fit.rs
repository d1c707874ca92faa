//! Fitting a single image under a JPEG byte budget.
//!
//! The search runs in two linear phases:
//!
//! 1. **Native**: encode the full-resolution image at decreasing quality
//!    (95, 90, ... down to but excluding the floor of 10) and stop at the
//!    first encode within budget.
//! 2. **Downscaled**: if no quality fits, shrink the image by
//!    `sqrt(budget / last_native_size) * 0.9` per side and repeat the quality
//!    scan from 85.
//!
//! If neither phase fits, the last encode is returned anyway with
//! `met_budget = false`. Missing the budget is a result, not an error.
//!
//! Only one encoded buffer is held at a time: each rejected attempt replaces
//! the previous one, and the flattened full-resolution image is released
//! before the downscaled phase starts encoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::SourceImage;
use crate::encode::{EncodeError, EncodeParams, JpegCodec, JpegEncoderCodec};
use crate::flatten::{flatten, FlatImage, FlattenError};
use crate::resize::{resize, scaled_dimensions, FilterType, ResizeError};

/// Default budget: 1 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;

/// Errors that prevent the search from producing any output.
#[derive(Debug, Error)]
pub enum FitError {
    /// The target's quality range or budget is unusable
    #[error("Invalid compression target: {0}")]
    InvalidTarget(String),

    /// The source image could not be normalized for JPEG
    #[error(transparent)]
    Flatten(#[from] FlattenError),

    /// Downscaling the source failed
    #[error("Resize failed: {0}")]
    Resize(#[from] ResizeError),

    /// Every encode attempt failed, so there is no output at all
    #[error("All {attempts} encode attempts failed, last error: {last_error}")]
    NoEncodableAttempt { attempts: usize, last_error: String },
}

/// Budget and quality schedule for one compression.
///
/// Quality scans start at `start_quality` (native resolution) and
/// `resize_start_quality` (downscaled), step down by `quality_step`, and stop
/// once the quality is at or below `min_quality`. The floor itself is never
/// encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionTarget {
    /// Maximum encoded size in bytes.
    pub max_bytes: u64,
    /// First quality tried at native resolution.
    pub start_quality: u8,
    /// First quality tried after downscaling.
    pub resize_start_quality: u8,
    /// Exclusive lower bound of both quality scans.
    pub min_quality: u8,
    /// Quality decrement between attempts.
    pub quality_step: u8,
    /// Extra shrink applied on top of the square-root scale factor (0, 1].
    pub safety_factor: f64,
    /// Resampling filter for the downscaled phase.
    pub filter: FilterType,
}

impl Default for CompressionTarget {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            start_quality: 95,
            resize_start_quality: 85,
            min_quality: 10,
            quality_step: 5,
            safety_factor: 0.9,
            filter: FilterType::Lanczos3,
        }
    }
}

impl CompressionTarget {
    /// Default schedule with a different budget.
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    /// Check that the schedule describes at least one attempt per phase.
    pub fn validate(&self) -> Result<(), FitError> {
        if self.max_bytes == 0 {
            return Err(FitError::InvalidTarget("max_bytes must be non-zero".into()));
        }
        if self.quality_step == 0 {
            return Err(FitError::InvalidTarget("quality_step must be non-zero".into()));
        }
        for (name, start) in [
            ("start_quality", self.start_quality),
            ("resize_start_quality", self.resize_start_quality),
        ] {
            if start > 100 {
                return Err(FitError::InvalidTarget(format!(
                    "{name} ({start}) must be at most 100"
                )));
            }
            if start <= self.min_quality {
                return Err(FitError::InvalidTarget(format!(
                    "{name} ({start}) must be above min_quality ({})",
                    self.min_quality
                )));
            }
        }
        if !(self.safety_factor > 0.0 && self.safety_factor <= 1.0) {
            return Err(FitError::InvalidTarget(format!(
                "safety_factor ({}) must be in (0, 1]",
                self.safety_factor
            )));
        }
        Ok(())
    }

    /// Whether an encode of `size` bytes is within budget.
    pub fn fits(&self, size: usize) -> bool {
        size as u64 <= self.max_bytes
    }

    /// Qualities tried by a scan starting at `start`, highest first.
    pub fn quality_steps(&self, start: u8) -> impl Iterator<Item = u8> {
        let (step, floor) = (self.quality_step.max(1), self.min_quality);
        std::iter::successors(Some(start), move |q| q.checked_sub(step))
            .take_while(move |&q| q > floor)
    }
}

/// Which phase of the search produced an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Quality reduction at the source dimensions.
    Native,
    /// Quality reduction after downscaling.
    Downscaled,
}

/// What a single encode attempt produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Encoded size in bytes.
    Encoded(usize),
    /// The encoder failed; the attempt counts as over budget.
    Failed(String),
}

/// One (quality, dimensions) pair tried by the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionAttempt {
    pub phase: Phase,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub outcome: AttemptOutcome,
}

impl CompressionAttempt {
    /// Encoded size, if the encoder succeeded.
    pub fn size(&self) -> Option<usize> {
        match self.outcome {
            AttemptOutcome::Encoded(size) => Some(size),
            AttemptOutcome::Failed(_) => None,
        }
    }
}

/// Output of [`SizeFittingCompressor::compress`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    /// JPEG bytes. Always a complete, decodable stream.
    pub bytes: Vec<u8>,
    /// Width of the encoded image.
    pub width: u32,
    /// Height of the encoded image.
    pub height: u32,
    /// Quality used for `bytes`.
    pub quality: u8,
    /// Whether `bytes` is within the target budget.
    pub met_budget: bool,
    /// Phase that produced `bytes`.
    pub phase: Phase,
    /// Width of the source image.
    pub original_width: u32,
    /// Height of the source image.
    pub original_height: u32,
    /// Every attempt in the order it was made.
    pub attempts: Vec<CompressionAttempt>,
}

impl CompressionResult {
    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn was_resized(&self) -> bool {
        (self.width, self.height) != (self.original_width, self.original_height)
    }
}

struct Encoded {
    bytes: Vec<u8>,
    quality: u8,
}

enum PhaseOutcome {
    Fitted(Encoded),
    Exhausted {
        last: Option<Encoded>,
        last_error: Option<EncodeError>,
    },
}

/// Two-phase search for a JPEG encode within a byte budget.
///
/// Generic over the codec so the search can be exercised with synthetic
/// encoders; [`SizeFittingCompressor::new`] uses [`JpegEncoderCodec`].
#[derive(Debug, Clone, Default)]
pub struct SizeFittingCompressor<C = JpegEncoderCodec> {
    codec: C,
}

impl SizeFittingCompressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: JpegCodec> SizeFittingCompressor<C> {
    /// Create a compressor that encodes through `codec`.
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Compress `image` so its JPEG encoding fits `target.max_bytes`.
    ///
    /// The image is flattened once up front. On success the first encode
    /// within budget is returned. If no attempt fits, the last encode is
    /// returned with `met_budget = false` and a warning is logged.
    ///
    /// # Errors
    ///
    /// * `FitError::InvalidTarget` for an unusable schedule
    /// * `FitError::Flatten` when the color mode cannot be normalized
    /// * `FitError::NoEncodableAttempt` when the codec never produced output
    pub fn compress(
        &self,
        image: SourceImage,
        target: &CompressionTarget,
    ) -> Result<CompressionResult, FitError> {
        target.validate()?;

        let flat = flatten(image)?;
        let (original_width, original_height) = flat.dimensions();
        let mut attempts = Vec::new();

        let finish = |encoded: Encoded,
                      (width, height): (u32, u32),
                      met_budget: bool,
                      phase: Phase,
                      attempts: Vec<CompressionAttempt>| CompressionResult {
            bytes: encoded.bytes,
            width,
            height,
            quality: encoded.quality,
            met_budget,
            phase,
            original_width,
            original_height,
            attempts,
        };

        let native = self.scan(
            &flat,
            Phase::Native,
            target.start_quality,
            target,
            &mut attempts,
        );
        let reference = match native {
            PhaseOutcome::Fitted(encoded) => {
                return Ok(finish(
                    encoded,
                    (original_width, original_height),
                    true,
                    Phase::Native,
                    attempts,
                ));
            }
            PhaseOutcome::Exhausted {
                last: Some(last), ..
            } => last,
            PhaseOutcome::Exhausted {
                last: None,
                last_error,
            } => {
                return Err(FitError::NoEncodableAttempt {
                    attempts: attempts.len(),
                    last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
                });
            }
        };

        let scaled = scaled_dimensions(
            original_width,
            original_height,
            reference.bytes.len(),
            target.max_bytes,
            target.safety_factor,
        );
        debug!(
            reference_size = reference.bytes.len(),
            budget = target.max_bytes,
            from = ?(original_width, original_height),
            to = ?scaled,
            "quality scan exhausted, downscaling"
        );

        let resized = resize(&flat, scaled.0, scaled.1, target.filter)?;
        drop(flat);

        match self.scan(
            &resized,
            Phase::Downscaled,
            target.resize_start_quality,
            target,
            &mut attempts,
        ) {
            PhaseOutcome::Fitted(encoded) => Ok(finish(
                encoded,
                scaled,
                true,
                Phase::Downscaled,
                attempts,
            )),
            PhaseOutcome::Exhausted { last, .. } => {
                let (encoded, dimensions, phase) = match last {
                    Some(last) => (last, scaled, Phase::Downscaled),
                    None => (reference, (original_width, original_height), Phase::Native),
                };
                warn!(
                    size = encoded.bytes.len(),
                    budget = target.max_bytes,
                    quality = encoded.quality,
                    width = dimensions.0,
                    height = dimensions.1,
                    "budget not reachable, returning best-effort encode"
                );
                Ok(finish(encoded, dimensions, false, phase, attempts))
            }
        }
    }

    /// Linear quality scan over one image. Stops at the first encode within budget.
    fn scan(
        &self,
        image: &FlatImage,
        phase: Phase,
        start: u8,
        target: &CompressionTarget,
        attempts: &mut Vec<CompressionAttempt>,
    ) -> PhaseOutcome {
        let (width, height) = image.dimensions();
        let mut last = None;
        let mut last_error = None;

        for quality in target.quality_steps(start) {
            let outcome = match self.codec.encode(image, EncodeParams::optimized(quality)) {
                Ok(bytes) => {
                    let size = bytes.len();
                    if target.fits(size) {
                        debug!(?phase, quality, size, width, height, "encode within budget");
                        attempts.push(CompressionAttempt {
                            phase,
                            quality,
                            width,
                            height,
                            outcome: AttemptOutcome::Encoded(size),
                        });
                        return PhaseOutcome::Fitted(Encoded { bytes, quality });
                    }
                    debug!(?phase, quality, size, budget = target.max_bytes, "encode over budget");
                    last = Some(Encoded { bytes, quality });
                    AttemptOutcome::Encoded(size)
                }
                Err(e) => {
                    debug!(?phase, quality, width, height, error = %e, "encode attempt failed");
                    let message = e.to_string();
                    last_error = Some(e);
                    AttemptOutcome::Failed(message)
                }
            };
            attempts.push(CompressionAttempt {
                phase,
                quality,
                width,
                height,
                outcome,
            });
        }

        PhaseOutcome::Exhausted { last, last_error }
    }
}

/// Compress `image` under `target` with the default JPEG codec.
pub fn compress_to_budget(
    image: SourceImage,
    target: &CompressionTarget,
) -> Result<CompressionResult, FitError> {
    SizeFittingCompressor::new().compress(image, target)
}
