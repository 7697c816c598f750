use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is absent: store events at debug, the
/// SQL layer quiet unless something goes wrong.
pub const DEFAULT_FILTER: &str = "info,store=debug,sea_orm=warn,sqlx=warn";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initialize tracing subscriber with compact human-readable output.
/// - Respects `RUST_LOG` if set
/// - Falls back to [`DEFAULT_FILTER`]
/// - Safe to call more than once; later calls are no-ops
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// Span fields such as `tenant_id` are flattened into each event so log
/// pipelines can filter by tenant.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .json()
        .with_current_span(true)
        .with_writer(io::stdout)
        .try_init();
}

/// Subscriber for unit tests: captured by the test harness instead of stdout.
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_test_writer()
        .try_init();
}
