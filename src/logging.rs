//! Logging setup for the ledger CLI
//!
//! Ledger events go to a rolling file under `log_dir`. In text mode they
//! are mirrored to stderr so stdout carries only command output.

use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directives used when `RUST_LOG` is unset.
///
/// A bare level applies to this crate only, dependencies stay at `warn`.
/// Anything that already looks like a directive list is used as is.
fn default_directives(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level)
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };

    // Dropping the guard flushes pending lines
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stderr_layer = fmt::layer()
            .with_target(false)
            .with_ansi(true)
            .with_writer(std::io::stderr);
        registry.with(file_layer).with(stderr_layer).init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_targets_this_crate() {
        assert_eq!(default_directives("debug"), "warn,pos_ledger=debug");
        assert_eq!(default_directives(" info "), "warn,pos_ledger=info");
    }

    #[test]
    fn test_directive_lists_pass_through() {
        assert_eq!(default_directives("pos_ledger=trace"), "pos_ledger=trace");
        assert_eq!(default_directives("info,csv=debug"), "info,csv=debug");
    }
}
