use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter, e.g. `orderflow=debug`.
pub const LOG_ENV: &str = "ORDERFLOW_LOG";

/// Initialize tracing from `ORDERFLOW_LOG`.
///
/// Defaults to "info" level if the variable is not set. Logs go to stderr so
/// stdout carries only the report.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}
