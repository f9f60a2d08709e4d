//! Logging setup shared by the command-line tools.
//!
//! Log lines go to stderr so stdout carries only the run summary. A log
//! directory may be configured to keep a daily file as well.

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Log level can be controlled via the `INVOKEDB_LOG` environment variable,
/// which takes precedence over `--verbose`:
/// - `INVOKEDB_LOG=debug` for verbose output
/// - `INVOKEDB_LOG=info` for standard output (default)
/// - `INVOKEDB_LOG=warn` for warnings and errors only
pub fn init(verbose: bool, log_dir: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_env("INVOKEDB_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;

            let file_appender = tracing_appender::rolling::daily(dir, "invokedb.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes on drop, so it has to live as long as the process
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        tracing::debug!("Logging to file in {:?}", dir);
    }
    Ok(())
}
