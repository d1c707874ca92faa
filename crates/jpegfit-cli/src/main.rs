//! `jpegfit` - batch-compress a folder of images under a per-file byte budget.

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use jpegfit_core::{compress_folder, BatchReport, FileOutcome, FileStatus};

use crate::cli::Cli;

const MIB: f64 = 1024.0 * 1024.0;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let options = cli.batch_options()?;
    tracing::debug!(?options, "starting batch");
    let report = compress_folder(&options)
        .with_context(|| format!("failed to compress {}", options.input_dir.display()))?;

    if report.files.is_empty() {
        println!("No supported image files found in {}", options.input_dir.display());
        return Ok(());
    }

    for file in &report.files {
        println!("{}", describe(file));
    }
    println!("{}", summary(&report));

    if !report.is_success() {
        bail!("{} file(s) could not be processed", report.failed());
    }
    Ok(())
}

fn file_name(outcome: &FileOutcome) -> String {
    outcome
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| outcome.input.display().to_string())
}

/// One line per file.
fn describe(outcome: &FileOutcome) -> String {
    let name = file_name(outcome);
    let original = outcome.original_size as f64 / MIB;
    match &outcome.status {
        FileStatus::Compressed {
            width,
            height,
            quality,
            size,
            resized,
        } => {
            let dims = if *resized {
                format!(", {width}x{height}")
            } else {
                String::new()
            };
            format!(
                "compressed  {name}: {original:.2}MB -> {:.2}MB (q{quality}{dims})",
                *size as f64 / MIB
            )
        }
        FileStatus::BestEffort {
            width,
            height,
            quality,
            size,
        } => format!(
            "over budget {name}: {original:.2}MB -> {:.2}MB (q{quality}, {width}x{height})",
            *size as f64 / MIB
        ),
        FileStatus::Skipped { copied: true } => {
            format!("skipped     {name}: {original:.2}MB already within budget, copied")
        }
        FileStatus::Skipped { copied: false } => {
            format!("skipped     {name}: {original:.2}MB already within budget")
        }
        FileStatus::Failed(message) => format!("failed      {name}: {message}"),
    }
}

fn summary(report: &BatchReport) -> String {
    format!(
        "{} file(s): {} compressed, {} over budget, {} skipped, {} failed",
        report.files.len(),
        report.compressed(),
        report.best_effort(),
        report.skipped(),
        report.failed()
    )
}
