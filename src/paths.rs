// Application path helpers
// Handles platform-specific locations for config, logs, markers, and locks

use std::path::PathBuf;

/// Environment variable that overrides the application directory.
/// Used by tests and by deployments that relocate the data directory.
pub const DIR_OVERRIDE_ENV: &str = "ATTENDANCE_TRACKER_DIR";

/// Well-known file locations for one installation.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root application directory (config, locks)
    pub app_dir: PathBuf,
    /// Log directory (log files, the success marker)
    pub log_dir: PathBuf,
}

impl Paths {
    /// Create paths rooted at the platform default application directory.
    pub fn default_paths() -> Self {
        let app_dir = Self::default_app_dir();
        Self {
            log_dir: app_dir.join("Logs"),
            app_dir,
        }
    }

    /// Create paths from the environment, falling back to platform defaults.
    pub fn from_env() -> Self {
        if let Ok(override_dir) = std::env::var(DIR_OVERRIDE_ENV) {
            let base = PathBuf::from(override_dir);
            return Self {
                log_dir: base.join("Logs"),
                app_dir: base,
            };
        }

        Self::default_paths()
    }

    fn default_app_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir()
                .map(|h| h.join("Library/Application Support/AttendanceTracker"))
                .unwrap_or_else(|| PathBuf::from("/tmp/attendance-tracker"))
        }

        #[cfg(windows)]
        {
            dirs::data_dir()
                .map(|d| d.join("AttendanceTracker"))
                .unwrap_or_else(|| PathBuf::from("C:\\AttendanceTracker"))
        }

        #[cfg(not(any(target_os = "macos", windows)))]
        {
            dirs::home_dir()
                .map(|h| h.join(".attendance-tracker"))
                .unwrap_or_else(|| PathBuf::from("/tmp/attendance-tracker"))
        }
    }

    /// Ensure the application and log directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.app_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }

    /// Candidate config file locations, in preference order.
    /// The log directory is checked first so a deployment can drop an
    /// updated config next to the logs without touching the install root.
    pub fn config_candidates(&self) -> [PathBuf; 2] {
        [
            self.log_dir.join("config.json"),
            self.app_dir.join("config.json"),
        ]
    }

    /// The last-success date marker written after a confirmed check-in.
    pub fn marker_file(&self) -> PathBuf {
        self.log_dir.join("last_success.txt")
    }

    /// Single-instance lock held by the watcher for its lifetime.
    pub fn watcher_lock_file(&self) -> PathBuf {
        self.app_dir.join("power_monitor.lock")
    }

    /// Liveness lock held by the check-in client while it runs.
    pub fn client_lock_file(&self) -> PathBuf {
        self.app_dir.join("attendance_tracker.lock")
    }

    /// Log file for a given binary, e.g. `power-monitor.log`.
    pub fn log_file(&self, name: &str) -> PathBuf {
        self.log_dir.join(name)
    }

    /// Redirect targets for the spawned client's stdout/stderr.
    pub fn client_stdout_log(&self) -> PathBuf {
        self.log_dir.join("client-stdout.log")
    }

    pub fn client_stderr_log(&self) -> PathBuf {
        self.log_dir.join("client-stderr.log")
    }
}
