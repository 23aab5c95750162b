// power-monitor: background watcher for OS session-lifecycle events
//
// Responsibilities:
// - Hold the single-instance lock for this machine
// - Receive wake/unlock/login notifications from the platform bridge
//   (or the polling fallback) over one channel
// - Launch the check-in client on each qualifying event, rate-limited
// - Keep running through launch failures; only signals stop it

use anyhow::{Context, Result};
use attendance_tracker::logging;
use attendance_tracker::paths::Paths;
use attendance_tracker::watcher::event::SessionEvent;
use attendance_tracker::watcher::launcher::ClientLauncher;
use attendance_tracker::watcher::lock::{self, InstanceLock, LockState};
use attendance_tracker::watcher::source;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const WATCHER_LOG: &str = "power-monitor.log";

/// Heartbeat period; proves liveness in the log without flooding it
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(300);

/// Bound on buffered, not-yet-handled session events
const EVENT_QUEUE_DEPTH: usize = 16;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            error!(%err, "power monitor failed");
            eprintln!("power monitor failed: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let paths = Paths::from_env();
    paths
        .ensure_dirs()
        .context("Failed to create application directories")?;
    logging::init(&paths, WATCHER_LOG, None);

    info!(pid = std::process::id(), "power monitor starting");

    let lock = match InstanceLock::acquire(&paths.watcher_lock_file())? {
        LockState::Acquired(lock) => lock,
        LockState::AlreadyRunning { pid } => {
            if let Some(pid) = pid {
                if !lock::process_is_alive(pid) {
                    // The lock outlived its recorded owner; flock should
                    // have released it, so this points at a lock-file copy
                    // or an unsupported filesystem
                    tracing::warn!(pid, "lock held but recorded owner is not alive");
                }
            }
            // Expected whenever login hooks fire twice; not an error
            info!(?pid, "another power monitor is already running, exiting");
            return Ok(0);
        }
    };

    let mut launcher = ClientLauncher::new(paths.clone());

    // The session that just started counts as an event of its own
    launcher.handle_event(SessionEvent::Startup);

    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let delivery = source::spawn(tx);
    info!(?delivery, "session event source ready");

    tokio::spawn(async {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            debug!("watcher heartbeat");
        }
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            maybe_event = rx.recv() => match maybe_event {
                Some(event) => {
                    launcher.handle_event(event);
                }
                None => {
                    error!("session event source closed, shutting down");
                    break;
                }
            },
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    lock.release();
    info!("power monitor stopped");
    Ok(0)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
