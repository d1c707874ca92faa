//! Folder-level driver around the size-fitting compressor.
//!
//! Every supported image directly inside the input directory is handled in
//! name order:
//!
//! - files already within budget are skipped, and copied unchanged when the
//!   output directory differs from the input directory
//! - everything else is decoded, fitted with [`compress_to_budget`] and written
//!   as JPEG, renamed to `.jpg` unless another file in the batch already owns
//!   that name
//!
//! A failure on one file is logged and recorded in the [`BatchReport`]; the
//! remaining files are still processed.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::decode::{decode_image, DecodeError};
use crate::fit::{compress_to_budget, CompressionResult, CompressionTarget, FitError};

/// Lowercase extensions picked up from the input directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Errors that stop a whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The input directory is missing or not a directory
    #[error("Input directory does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    /// Listing the input or creating the output directory failed
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors for a single file. These are recorded, not propagated.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Fit(#[from] FitError),
}

/// Where to read, where to write, and the budget to fit.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    /// Output directory. `None` rewrites the input directory in place.
    pub output_dir: Option<PathBuf>,
    pub target: CompressionTarget,
}

impl BatchOptions {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            target: CompressionTarget::default(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    /// Re-encoded within budget.
    Compressed {
        width: u32,
        height: u32,
        quality: u8,
        size: u64,
        resized: bool,
    },
    /// Re-encoded, but still over budget.
    BestEffort {
        width: u32,
        height: u32,
        quality: u8,
        size: u64,
    },
    /// Already within budget; `copied` when it was copied to a separate output directory.
    Skipped { copied: bool },
    /// Processing failed with the given message.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Written file, if any.
    pub output: Option<PathBuf>,
    pub original_size: u64,
    pub status: FileStatus,
}

/// Per-file outcomes of a batch, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }

    pub fn compressed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Compressed { .. }))
    }

    pub fn best_effort(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::BestEffort { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// List supported image files directly inside `dir`, sorted by path.
pub fn find_images(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let io_err = |source: io::Error| BatchError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut images = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Output path for a re-encoded file: same stem, `.jpg` unless the input
/// already uses a JPEG extension.
pub fn jpeg_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let file_name = input.file_name().map(PathBuf::from).unwrap_or_default();
    let is_jpeg = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false);

    let out = output_dir.join(file_name);
    if is_jpeg {
        out
    } else {
        out.with_extension("jpg")
    }
}

/// Decode `input`, fit it under `target` and write the JPEG to `output`.
pub fn compress_file(
    input: &Path,
    output: &Path,
    target: &CompressionTarget,
) -> Result<CompressionResult, FileError> {
    let bytes = fs::read(input)?;
    let image = decode_image(&bytes)?;
    drop(bytes);

    let result = compress_to_budget(image, target)?;
    fs::write(output, &result.bytes)?;
    Ok(result)
}

/// Pick an output path per input.
///
/// Inputs are renamed to `.jpg` via [`jpeg_output_path`] unless that path is
/// another input's name in `output_dir` or was already handed out; those keep
/// their own file name so no file in the batch is overwritten by another.
pub fn plan_outputs(images: &[PathBuf], output_dir: &Path) -> Vec<PathBuf> {
    let mut claimed: HashSet<PathBuf> = images
        .iter()
        .filter_map(|input| input.file_name())
        .map(|name| output_dir.join(name))
        .collect();

    images
        .iter()
        .map(|input| {
            let kept = output_dir.join(input.file_name().unwrap_or_default());
            let renamed = jpeg_output_path(input, output_dir);
            if renamed == kept || claimed.insert(renamed.clone()) {
                renamed
            } else {
                warn!(
                    file = %input.display(),
                    taken = %renamed.display(),
                    "output name already used in this batch, keeping the input file name"
                );
                kept
            }
        })
        .collect()
}

fn dir_error(path: &Path) -> impl FnOnce(io::Error) -> BatchError {
    let path = path.to_path_buf();
    move |source| BatchError::Io { path, source }
}

/// Process every supported image in `options.input_dir`.
///
/// Both directories are canonicalized first, so an output directory spelled
/// differently from the input directory is still recognized as the same one.
///
/// # Errors
///
/// Only directory-level problems are errors. Per-file failures are reported
/// as [`FileStatus::Failed`] and logged.
pub fn compress_folder(options: &BatchOptions) -> Result<BatchReport, BatchError> {
    if !options.input_dir.is_dir() {
        return Err(BatchError::MissingInput(options.input_dir.clone()));
    }

    let input_dir = fs::canonicalize(&options.input_dir).map_err(dir_error(&options.input_dir))?;
    let output_dir = options.output_dir();
    fs::create_dir_all(output_dir).map_err(dir_error(output_dir))?;
    let output_dir = fs::canonicalize(output_dir).map_err(dir_error(output_dir))?;

    let images = find_images(&input_dir)?;
    let mut report = BatchReport::default();

    if images.is_empty() {
        warn!(dir = %input_dir.display(), "no supported image files found");
        return Ok(report);
    }

    info!(count = images.len(), budget = options.target.max_bytes, "compressing images");

    let outputs = plan_outputs(&images, &output_dir);
    for (input, output) in images.into_iter().zip(outputs) {
        let outcome = process_one(&input, &output, &output_dir, &options.target);
        if let FileStatus::Failed(message) = &outcome.status {
            error!(file = %input.display(), error = %message, "failed to process image");
        }
        report.files.push(outcome);
    }

    info!(
        compressed = report.compressed(),
        best_effort = report.best_effort(),
        skipped = report.skipped(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}

fn process_one(
    input: &Path,
    output: &Path,
    output_dir: &Path,
    target: &CompressionTarget,
) -> FileOutcome {
    let failed = |original_size, message: String| FileOutcome {
        input: input.to_path_buf(),
        output: None,
        original_size,
        status: FileStatus::Failed(message),
    };

    let original_size = match fs::metadata(input) {
        Ok(meta) => meta.len(),
        Err(e) => return failed(0, e.to_string()),
    };

    if original_size <= target.max_bytes {
        let copy_to = input.file_name().map(|name| output_dir.join(name));
        let copied = match copy_to {
            Some(dest) if dest != input => {
                if let Err(e) = fs::copy(input, &dest) {
                    return failed(original_size, e.to_string());
                }
                Some(dest)
            }
            _ => None,
        };
        info!(file = %input.display(), size = original_size, "already within budget, skipping");
        return FileOutcome {
            input: input.to_path_buf(),
            status: FileStatus::Skipped {
                copied: copied.is_some(),
            },
            output: copied,
            original_size,
        };
    }

    let result = match compress_file(input, output, target) {
        Ok(result) => result,
        Err(e) => return failed(original_size, e.to_string()),
    };

    // In place with a new extension: the source would otherwise linger next to its JPEG.
    if output != input && input.parent() == Some(output_dir) {
        if let Err(e) = fs::remove_file(input) {
            warn!(file = %input.display(), error = %e, "could not remove replaced source file");
        }
    }

    let size = result.len() as u64;
    let status = if result.met_budget {
        info!(
            file = %output.display(),
            size,
            width = result.width,
            height = result.height,
            quality = result.quality,
            "compressed"
        );
        FileStatus::Compressed {
            width: result.width,
            height: result.height,
            quality: result.quality,
            size,
            resized: result.was_resized(),
        }
    } else {
        warn!(file = %output.display(), size, budget = target.max_bytes, "could not reach budget");
        FileStatus::BestEffort {
            width: result.width,
            height: result.height,
            quality: result.quality,
            size,
        }
    };

    FileOutcome {
        input: input.to_path_buf(),
        output: Some(output.to_path_buf()),
        original_size,
        status,
    }
}
