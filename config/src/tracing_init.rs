//! Subscriber setup shared by binaries.
//!
//! - **RUST_LOG**: filter, e.g. `info` or `vectorizer=debug`. Default: `info`.
//! - `log_dir`: when set, events are also written to a daily-rolling file
//!   `vectorizer.log.<date>` in that directory (plain text, no ANSI).
//!
//! Console output goes to stderr so stdout stays clean for command output.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "vectorizer.log";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Keep the returned guard alive for the life of the
/// process; dropping it flushes and stops the file writer.
pub fn init(
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            tracing::info!(dir = %dir.display(), "logging to file");
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).try_init()?;
            Ok(None)
        }
    }
}
