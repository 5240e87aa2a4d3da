use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use super::TracingConfig;

pub const DEFAULT_FILTER: &str = "info,medscribe=debug,tower_http=debug";

/// Builds the env filter: `RUST_LOG` wins, then the configured level, then the default.
pub fn build_env_filter(configured_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| match configured_level {
            Some(level) if !level.trim().is_empty() => EnvFilter::try_new(level.trim()),
            _ => EnvFilter::try_new(DEFAULT_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the tracing subscriber with structured logging.
pub fn init_tracing(config: &TracingConfig, port: u16) {
    let env_filter = build_env_filter(config.level.as_deref());

    if config.json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    tracing::info!(
        port = port,
        environment = %config.environment,
        json_format = config.json_format,
        "Tracing initialized"
    );
}
