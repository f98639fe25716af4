use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Routes `tracing` output to a daily rolling file under `directory`.
///
/// Stdout is left to command output. Keep the returned guard alive for the
/// life of the process or buffered lines are lost.
pub fn initialize_logging(directory: &Path, file_name: &str) -> WorkerGuard {
    // Create the log directory if it doesn't exist
    let _ = std::fs::create_dir_all(directory);

    let file_appender = tracing_appender::rolling::daily(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Logging initialized successfully.");
    guard
}
