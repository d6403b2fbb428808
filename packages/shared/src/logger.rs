//! Logging setup utilities for the Renraku chat system.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for both the library crates and the binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "renraku-server", "renraku-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "renraku_server={level},renraku_client={level},{bin}={level},tower_http={level}",
                    level = default_log_level,
                    bin = binary_name.replace("-", "_"),
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
