//! Tracing initialization for Lambda functions.
//!
//! Production output is JSON with flattened event fields, the shape
//! CloudWatch Logs Insights queries expect. Development mode switches to
//! a human-readable formatter for `cargo lambda watch` style local runs.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with JSON formatting for CloudWatch Logs.
///
/// Call once at the start of the Lambda `main` function, before
/// `lambda_runtime::run()`. The log level is controlled via the
/// `RUST_LOG` environment variable and defaults to `info`.
pub fn init_tracing() {
    init_tracing_with(false);
}

/// Initialize tracing, selecting the formatter by mode: JSON for
/// CloudWatch, a pretty formatter for local development.
pub fn init_tracing_with(dev_mode: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if dev_mode {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_target(true))
            .init();
        return;
    }

    let fmt_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
