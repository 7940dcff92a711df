//! Logging initialization.
//!
//! Controlled by two environment variables:
//! - `COVMERGE_LOG` → an `EnvFilter` directive (default `warn`), e.g.
//!   `info` or `covmerge_core::reconcile=debug`
//! - `COVMERGE_LOG_FORMAT=json` → JSON events and span closes instead of the
//!   human-readable formatter
//!
//! Everything goes to stderr; stdout is reserved for the run summary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Filter directive variable.
pub const LOG_ENV: &str = "COVMERGE_LOG";

/// Output format variable.
pub const LOG_FORMAT_ENV: &str = "COVMERGE_LOG_FORMAT";

/// Install the global subscriber. Call once, early in `main`.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("warning: logging already initialized: {e}");
    }
}
