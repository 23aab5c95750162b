// Event source selection
//
// The capability check runs once at startup: platforms with a native
// notification bridge get event-driven delivery on a dedicated thread;
// everything else (and any bridge that fails to initialise) degrades to
// wall-clock polling. Either way, events arrive on one channel and are
// consumed by one synchronous handler.

pub mod polling;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(windows)]
pub mod windows;

use crate::watcher::event::{EventDelivery, SessionEvent};
use tokio::sync::mpsc;

/// Start delivering session events into `tx` and report which mechanism
/// was selected.
pub fn spawn(tx: mpsc::Sender<SessionEvent>) -> EventDelivery {
    #[cfg(target_os = "macos")]
    {
        match self::macos::spawn(tx.clone()) {
            Ok(()) => return EventDelivery::EventDriven,
            Err(err) => {
                tracing::warn!(%err, "native event bridge unavailable, falling back to polling")
            }
        }
    }

    #[cfg(windows)]
    {
        match self::windows::spawn(tx.clone()) {
            Ok(()) => return EventDelivery::EventDriven,
            Err(err) => {
                tracing::warn!(%err, "native event bridge unavailable, falling back to polling")
            }
        }
    }

    polling::spawn(tx);
    EventDelivery::PollingFallback
}
