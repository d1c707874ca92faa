//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "JPEGFIT_LOG";

/// Filter used when `JPEGFIT_LOG` is unset or invalid.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "jpegfit_core=debug,jpegfit=debug,info"
    } else {
        "info"
    }
}

/// Initialize human-readable logging on stderr.
///
/// Respects `JPEGFIT_LOG`; otherwise logs at `info`, or `debug` for the
/// jpegfit crates when `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
