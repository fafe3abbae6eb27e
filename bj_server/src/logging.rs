//! Structured logging configuration.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Log levels are configurable via the `RUST_LOG` env var. Records emitted
/// through the `log` facade by the blackjack library are captured as well.
///
/// # Example
///
/// ```no_run
/// use bj_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}
