//! Logging Infrastructure
//!
//! Human-readable console output for development, daily-rotated JSON files
//! when a log directory exists. `RUST_LOG` overrides the configured level,
//! so individual targets can be turned up without a restart.

use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None);
}

fn base_filter(log_level: Option<&str>) -> EnvFilter {
    EnvFilter::new(log_level.unwrap_or("info"))
}

/// Initialize the logger with optional file output
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| base_filter(log_level));

    if let Some(dir) = log_dir
        && std::path::Path::new(dir).exists()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "dispatch-server");
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(file_appender)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_becomes_the_filter_directive() {
        assert_eq!(base_filter(Some("debug")).to_string(), "debug");
        assert_eq!(base_filter(None).to_string(), "info");
    }
}
