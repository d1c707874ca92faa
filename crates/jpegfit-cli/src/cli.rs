//! Command-line arguments for `jpegfit`.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use jpegfit_core::{BatchOptions, CompressionTarget, FilterType, DEFAULT_MAX_BYTES};

/// jpegfit - compress every image in a folder to fit under a byte budget
#[derive(Parser, Debug)]
#[command(name = "jpegfit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder containing the images (jpg, jpeg, png, bmp, tiff)
    pub input_dir: PathBuf,

    /// Write results here instead of overwriting the input folder
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Budget per image in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES, conflicts_with = "target_mb")]
    pub target_bytes: u64,

    /// Budget per image in MiB (overrides --target-bytes)
    #[arg(long)]
    pub target_mb: Option<f64>,

    /// First JPEG quality tried at full resolution
    #[arg(long, default_value_t = 95)]
    pub start_quality: u8,

    /// First JPEG quality tried after downscaling
    #[arg(long, default_value_t = 85)]
    pub resize_start_quality: u8,

    /// Quality floor; the scan stops before reaching it
    #[arg(long, default_value_t = 10)]
    pub min_quality: u8,

    /// Quality decrement between attempts
    #[arg(long, default_value_t = 5)]
    pub step: u8,

    /// Use a faster, lower-quality filter when downscaling
    #[arg(long)]
    pub fast_resize: bool,

    /// Enable verbose output (one line per encode attempt)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Budget in bytes after resolving `--target-mb`.
    pub fn max_bytes(&self) -> Result<u64> {
        match self.target_mb {
            Some(mb) => {
                ensure!(mb.is_finite() && mb > 0.0, "--target-mb must be positive, got {mb}");
                Ok((mb * 1024.0 * 1024.0) as u64)
            }
            None => Ok(self.target_bytes),
        }
    }

    pub fn target(&self) -> Result<CompressionTarget> {
        let target = CompressionTarget {
            max_bytes: self.max_bytes()?,
            start_quality: self.start_quality,
            resize_start_quality: self.resize_start_quality,
            min_quality: self.min_quality,
            quality_step: self.step,
            filter: if self.fast_resize {
                FilterType::Bilinear
            } else {
                FilterType::Lanczos3
            },
            ..Default::default()
        };
        target.validate()?;
        Ok(target)
    }

    pub fn batch_options(&self) -> Result<BatchOptions> {
        Ok(BatchOptions {
            input_dir: self.input_dir.clone(),
            output_dir: self.output.clone(),
            target: self.target()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jpegfit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_match_core_target() {
        let cli = parse(&["photos"]);
        assert_eq!(cli.input_dir, PathBuf::from("photos"));
        assert_eq!(cli.output, None);
        assert_eq!(cli.target().unwrap(), CompressionTarget::default());
    }

    #[test]
    fn test_target_mb() {
        let cli = parse(&["photos", "--target-mb", "2.5"]);
        assert_eq!(cli.max_bytes().unwrap(), 2_621_440);
    }

    #[test]
    fn test_target_mb_must_be_positive() {
        let cli = parse(&["photos", "--target-mb", "0"]);
        assert!(cli.max_bytes().is_err());
    }

    #[test]
    fn test_target_bytes_conflicts_with_target_mb() {
        let result = Cli::try_parse_from([
            "jpegfit",
            "in",
            "--target-bytes",
            "10",
            "--target-mb",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quality_schedule_flags() {
        let cli = parse(&[
            "in",
            "-o",
            "out",
            "--start-quality",
            "90",
            "--resize-start-quality",
            "80",
            "--min-quality",
            "20",
            "--step",
            "10",
            "--fast-resize",
        ]);
        let options = cli.batch_options().unwrap();

        assert_eq!(options.output_dir, Some(PathBuf::from("out")));
        assert_eq!(options.target.start_quality, 90);
        assert_eq!(options.target.resize_start_quality, 80);
        assert_eq!(options.target.min_quality, 20);
        assert_eq!(options.target.quality_step, 10);
        assert_eq!(options.target.filter, FilterType::Bilinear);
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let cli = parse(&["in", "--min-quality", "90"]);
        assert!(cli.target().is_err());
    }

    #[test]
    fn test_missing_input_dir_is_usage_error() {
        assert!(Cli::try_parse_from(["jpegfit"]).is_err());
    }
}
