//! Tracing subscriber setup.
//!
//! Console output goes to stderr so it never interleaves with command output
//! on stdout. With `--log-file` a second, plain-text layer is written through a
//! non-blocking appender; the returned guard must live until exit so buffered
//! lines are flushed.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::CliError;

/// Default filter by `-v` count when `RUST_LOG` is unset.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,wpload=info",
        1 => "info,wpload=debug",
        _ => "debug,wpload=trace",
    }
}

/// Default location for `--log-file` without a path.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wpload")
        .join("wpload.log")
}

/// Installs the global subscriber.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, CliError> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0)
        .with_filter(filter());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| CliError::Logging(format!("{} is not a file path", path.display())))?;
            std::fs::create_dir_all(dir)?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_crate_level() {
        assert!(default_directive(0).contains("wpload=info"));
        assert!(default_directive(1).contains("wpload=debug"));
        assert!(default_directive(5).contains("wpload=trace"));
    }

    #[test]
    fn test_default_log_path_names_the_app() {
        let path = default_log_path();
        assert_eq!(path.file_name().unwrap(), "wpload.log");
        assert!(path.parent().unwrap().ends_with("wpload"));
    }
}
