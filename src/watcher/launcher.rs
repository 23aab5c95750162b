// Client launcher
// Resolves the check-in binary, probes for a running instance, and spawns
// it detached with its output redirected to log files.

use crate::paths::Paths;
use crate::watcher::event::SessionEvent;
use crate::watcher::gate::LaunchGate;
use crate::watcher::lock::InstanceLock;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{error, info, warn};

/// Name of the client binary the watcher launches.
#[cfg(windows)]
pub const CLIENT_BIN_NAME: &str = "attendance-tracker.exe";
#[cfg(not(windows))]
pub const CLIENT_BIN_NAME: &str = "attendance-tracker";

/// What `handle_event` decided, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchDecision {
    Launched { pid: u32 },
    RateLimited,
    AlreadyRunning,
    Failed,
}

pub struct ClientLauncher {
    paths: Paths,
    /// Pinned binary location; `None` resolves fresh on every launch, so a
    /// client installed after watcher startup is still picked up
    client_path: Option<PathBuf>,
    gate: LaunchGate,
}

impl ClientLauncher {
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            client_path: None,
            gate: LaunchGate::new(),
        }
    }

    pub fn with_client_path(paths: Paths, client_path: PathBuf) -> Self {
        Self {
            paths,
            client_path: Some(client_path),
            gate: LaunchGate::new(),
        }
    }

    /// React to one session event. Never fails the watcher: every error is
    /// logged and swallowed so the next event still gets handled.
    pub fn handle_event(&mut self, event: SessionEvent) -> LaunchDecision {
        info!(%event, "handling session event");

        if !self.gate.permits() {
            info!(%event, "skipping launch, too soon after the previous one");
            return LaunchDecision::RateLimited;
        }

        if InstanceLock::is_held(&self.paths.client_lock_file()) {
            info!("client is already running, skipping launch");
            return LaunchDecision::AlreadyRunning;
        }

        // Record before spawning: a failed spawn should not be retried in a
        // tight burst of duplicate notifications either.
        self.gate.record();

        match self.spawn_client() {
            Ok(pid) => {
                info!(pid, "launched check-in client");
                LaunchDecision::Launched { pid }
            }
            Err(err) => {
                error!(%err, "failed to launch client");
                LaunchDecision::Failed
            }
        }
    }

    fn spawn_client(&self) -> Result<u32> {
        let client_path = match &self.client_path {
            Some(path) => path.clone(),
            None => resolve_client_path(&self.paths)
                .context("Could not find the attendance-tracker binary")?,
        };

        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.paths.client_stdout_log())
            .with_context(|| {
                format!(
                    "Failed to open client stdout log: {}",
                    self.paths.client_stdout_log().display()
                )
            })?;
        let stderr = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.paths.client_stderr_log())
            .with_context(|| {
                format!(
                    "Failed to open client stderr log: {}",
                    self.paths.client_stderr_log().display()
                )
            })?;

        let mut command = Command::new(&client_path);
        command
            .current_dir(&self.paths.app_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            use windows::Win32::System::Threading::{CREATE_NO_WINDOW, DETACHED_PROCESS};
            command.creation_flags((CREATE_NO_WINDOW | DETACHED_PROCESS).0);
        }

        let child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", client_path.display()))?;

        Ok(child.id())
    }
}

fn resolve_client_path(paths: &Paths) -> Option<PathBuf> {
    // Next to the watcher executable (the normal install layout)
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidate = dir.join(CLIENT_BIN_NAME);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    // Application directory fallback
    let candidate = paths.app_dir.join(CLIENT_BIN_NAME);
    if candidate.exists() {
        return Some(candidate);
    }

    warn!(
        "no {} next to the watcher or in {}",
        CLIENT_BIN_NAME,
        paths.app_dir.display()
    );
    None
}
