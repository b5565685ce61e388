//! Diagnostic tracing for the loop.
//!
//! Tracing output is for debugging `ralph-loop` itself and goes to stderr.
//! It is separate from what the loop prints for the user (iteration banners,
//! streamed agent progress on stdout) and from the progress log file, which
//! is always appended to regardless of `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "ralph_loop=debug,warn" } else { "warn" }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` raises this crate to `debug`.
///
/// ```bash
/// RUST_LOG=ralph_loop=trace ralph-loop run cursor-agent
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
