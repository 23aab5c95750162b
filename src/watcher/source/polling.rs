// Polling fallback: suspend detection via wall-clock jumps
//
// While the machine sleeps, the interval timer stops ticking but the wall
// clock keeps moving. A tick that observes far more wall-clock time than
// the poll period can only mean the process was suspended in between, so
// it is reported as a wake event. Unlock/login cannot be synthesised this
// way; wake is the one event every platform gets.

use crate::watcher::event::SessionEvent;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::info;

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Extra wall-clock slack beyond the poll period before a gap counts as a
/// suspend. Covers scheduler delay and minor clock adjustments.
const JUMP_TOLERANCE: Duration = Duration::from_secs(90);

/// Decide whether an observed gap between ticks indicates a suspend.
pub fn wall_clock_jumped(poll_interval: Duration, observed: Duration) -> bool {
    observed > poll_interval + JUMP_TOLERANCE
}

/// Start the polling loop on the runtime. Exits when the receiver closes.
pub fn spawn(tx: mpsc::Sender<SessionEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;
        let mut last_tick = SystemTime::now();

        loop {
            interval.tick().await;
            let now = SystemTime::now();
            let observed = now.duration_since(last_tick).unwrap_or_default();
            last_tick = now;

            if wall_clock_jumped(POLL_INTERVAL, observed) {
                info!(
                    gap_seconds = observed.as_secs(),
                    "wall clock jumped across a tick, treating as system wake"
                );
                if tx.send(SessionEvent::Wake).await.is_err() {
                    break;
                }
            }
        }
    });
}
