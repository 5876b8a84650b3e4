//! Tracing subscriber setup for the `debye` binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a compact stderr logger.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `info`, or `debug`
/// when `verbose` is set. Stdout is left for the report itself.
pub fn init_logger(verbose: bool) {
    let default = if verbose {
        "debye_fit=debug,warn"
    } else {
        "debye_fit=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. from tests) is harmless; ignore the error.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
