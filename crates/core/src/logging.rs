//! Logging infrastructure for askdoc.
//!
//! Sets up the tracing subscriber. Logs go to stderr so stdout stays
//! clean for answers and exported data.

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};

/// Initialize the tracing subscriber.
///
/// Filter directives come from the explicit `log_level` when given,
/// otherwise from `RUST_LOG`, otherwise `info`. Color output honors
/// both the `no_color` flag and the `NO_COLOR` environment variable.
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let directives = log_level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", directives, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color && std::env::var("NO_COLOR").is_err())
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}
