// attendance-tracker: one check-in run, then exit
//
// Exit codes: 0 = checked in or already satisfied today,
//             1 = configuration error or retry exhaustion.

use attendance_tracker::checkin::client;
use attendance_tracker::checkin::config::CheckinConfig;
use attendance_tracker::logging;
use attendance_tracker::paths::Paths;
use attendance_tracker::watcher::lock::{InstanceLock, LockState};
use tracing::{error, info, warn};

const CLIENT_LOG: &str = "attendance-tracker.log";

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let paths = Paths::from_env();
    if let Err(err) = paths.ensure_dirs() {
        eprintln!("failed to create application directories: {err}");
        return 1;
    }

    // Configuration is loaded before logging so its `logging` section can
    // shape the subscriber; a load failure still gets a default subscriber
    // to report through.
    let config = match CheckinConfig::load(&paths) {
        Ok(config) => config,
        Err(err) => {
            logging::init(&paths, CLIENT_LOG, None);
            error!(%err, "cannot load configuration");
            return 1;
        }
    };
    logging::init(&paths, CLIENT_LOG, Some(&config.logging));

    info!(
        pid = std::process::id(),
        version = %config.version,
        "attendance tracker starting"
    );

    // Held for the process lifetime so the watcher can tell we are running.
    // Contention is not fatal: a duplicate check-in is idempotent (HTTP 208).
    let _liveness = match InstanceLock::acquire(&paths.client_lock_file()) {
        Ok(LockState::Acquired(lock)) => Some(lock),
        Ok(LockState::AlreadyRunning { pid }) => {
            warn!(?pid, "another check-in client appears to be running, continuing");
            None
        }
        Err(err) => {
            warn!(%err, "could not create liveness lock, continuing");
            None
        }
    };

    match client::run(&config, &paths).await {
        Ok(outcome) => {
            info!(?outcome, "run complete");
            outcome.exit_code()
        }
        Err(err) => {
            error!(%err, "run failed");
            1
        }
    }
}
