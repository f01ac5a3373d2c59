use std::io;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

fn env_filter(default_level: Level) -> EnvFilter {
    // Respects RUST_LOG, falls back to default_level
    EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy()
}

/// Initialise tracing on stderr, keeping stdout free for lookup results
pub fn init(default_level: Level) {
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(true).with_ansi(true).compact();

    tracing_subscriber::registry().with(env_filter(default_level)).with(stderr_layer).init();
}

/// Initialise tracing on stderr plus a non-blocking hourly log file
pub fn init_with_file(app_name: &str, log_dir: &str, default_level: Level) -> WorkerGuard {
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::hourly(log_dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(non_blocking).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(false).compact();
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(true).with_ansi(true).compact();

    tracing_subscriber::registry().with(env_filter(default_level)).with(file_layer).with(stderr_layer).init();

    guard
}

/// Parse a level name from configuration, defaulting to INFO
pub fn parse_level(level: &str) -> Level {
    level.parse().unwrap_or(Level::INFO)
}
