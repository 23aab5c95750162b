// Daily gate + retry protocol
//
// One run is a linear sequence: startup delay, gate check, bounded retry
// loop, marker write. The delay between attempts is fixed: the expected
// failure mode is "machine just woke up, network not up yet", which clears
// on its own within a bounded window.

use crate::checkin::config::CheckinConfig;
use crate::checkin::http::{CheckinRequest, CheckinTransport};
use crate::checkin::marker::SuccessMarker;
use crate::paths::Paths;
use anyhow::Result;
use tracing::{error, info};

/// Terminal states of one client run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The marker already held today's date; no request was issued
    AlreadyCheckedIn,
    /// The server confirmed a check-in (200 or 208) and the marker was written
    CheckedIn,
    /// Every attempt failed
    RetriesExhausted,
}

impl RunOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::AlreadyCheckedIn | RunOutcome::CheckedIn => 0,
            RunOutcome::RetriesExhausted => 1,
        }
    }
}

/// Run the full client sequence against an already-loaded configuration.
pub async fn run(config: &CheckinConfig, paths: &Paths) -> Result<RunOutcome> {
    let startup_delay = config.startup_delay();
    if !startup_delay.is_zero() {
        info!(seconds = startup_delay.as_secs(), "startup delay");
        tokio::time::sleep(startup_delay).await;
    }

    let marker = SuccessMarker::new(paths.marker_file());
    let today = chrono::Local::now().date_naive();
    if marker.is_satisfied(today) {
        info!(%today, "already checked in today, nothing to do");
        return Ok(RunOutcome::AlreadyCheckedIn);
    }

    let transport = CheckinTransport::new(config)?;
    if check_in(config, &transport).await {
        // Record the day the run finished; a retry loop that straddles
        // midnight should gate tomorrow's runs, not today's.
        marker.record(chrono::Local::now().date_naive())?;
        Ok(RunOutcome::CheckedIn)
    } else {
        Ok(RunOutcome::RetriesExhausted)
    }
}

/// The retry protocol: up to `max_retry_attempts` POSTs with a fixed delay
/// between attempts. Returns true as soon as the server answers 200 or 208.
pub async fn check_in(config: &CheckinConfig, transport: &CheckinTransport) -> bool {
    let max_attempts = config.server.max_retry_attempts;
    let delay = config.retry_delay();
    let request = CheckinRequest::new(&config.version);

    info!(
        url = transport.url(),
        hostname = %request.hostname,
        max_attempts,
        delay_seconds = delay.as_secs(),
        "starting check-in attempts"
    );

    for attempt in 1..=max_attempts {
        match transport.post(&request).await {
            Ok(status) if status.is_success() => {
                info!(attempt, ?status, "server accepted check-in");
                return true;
            }
            Ok(status) => {
                error!(attempt, max_attempts, ?status, "unexpected response");
            }
            Err(err) => {
                error!(attempt, max_attempts, %err, "connection failed");
            }
        }

        if attempt < max_attempts {
            info!(seconds = delay.as_secs(), "waiting before next attempt");
            tokio::time::sleep(delay).await;
        }
    }

    error!(max_attempts, "failed to connect after all attempts");
    false
}
