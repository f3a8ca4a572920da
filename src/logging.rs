//! # Structured Logging Bootstrap
//!
//! Environment-aware tracing initialization. Safe to call more than once;
//! an already-installed global subscriber is left in place.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific defaults.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized, continuing with the existing one");
        }

        tracing::info!(environment = %environment, "Structured logging initialized");
    });
}

fn get_environment() -> String {
    std::env::var("CACHEGRID_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}
