//! Tracing subscriber setup.
//!
//! Logs go to stderr so board output on stdout stays clean. `RETROBOARD_LOG`
//! takes an `EnvFilter` directive and wins over `--verbose`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "RETROBOARD_LOG";

/// Directive used when `RETROBOARD_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "retroboard=debug"
    } else {
        "retroboard=info"
    }
}

pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool, json: bool) {
    let filter = build_filter(verbose);
    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    // Already installed (tests, embedding); keep the existing one.
    let _ = result;
}
