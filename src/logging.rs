//! Logging setup shared by both binaries.
//!
//! Two layers: stderr (filtered by `RUST_LOG`, falling back to the
//! configured level) and a persistent per-binary log file that always
//! records at the configured level with ANSI disabled. The file is
//! size-capped: when it outgrows the limit it is renamed to `<name>.old`
//! before the fresh file is opened, keeping one generation of history.

use crate::paths::Paths;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer as _;

/// Optional logging overrides carried in the `logging` section of
/// `config.json`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct LoggingConfig {
    /// Log level for both layers unless `RUST_LOG` overrides stderr
    pub level: Option<String>,
    /// Size cap for the log file before rotation, in megabytes
    pub max_size_mb: Option<u64>,
}

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_MAX_SIZE_MB: u64 = 10;

/// Rotate `path` aside to `<path>.old` if it exceeds `max_bytes`.
pub fn rotate_oversized(path: &std::path::Path, max_bytes: u64) {
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.len() > max_bytes {
            let mut backup = path.as_os_str().to_owned();
            backup.push(".old");
            let _ = std::fs::rename(path, backup);
        }
    }
}

/// Initialise the process-wide tracing subscriber.
///
/// `file_name` is the per-binary log file (e.g. `power-monitor.log`).
/// Safe to call more than once; later calls are no-ops.
pub fn init(paths: &Paths, file_name: &str, config: Option<&LoggingConfig>) {
    let level = config
        .and_then(|c| c.level.clone())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let max_bytes = config
        .and_then(|c| c.max_size_mb)
        .unwrap_or(DEFAULT_MAX_SIZE_MB)
        * 1024
        * 1024;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_lowercase()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let log_path = paths.log_file(file_name);
    rotate_oversized(&log_path, max_bytes);

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match file {
        Ok(file) => {
            let file_filter = tracing_subscriber::EnvFilter::new(level.to_lowercase());
            let file_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .with_filter(file_filter);

            let _ = tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init();
        }
        Err(_) => {
            // Stderr only; the log directory may be unwritable
            let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
        }
    }
}
