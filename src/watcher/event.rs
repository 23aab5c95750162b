// Session lifecycle events and how they are delivered

/// A discrete OS session-lifecycle notification. Every platform backend
/// funnels into this one enum; the handler does not care which API
/// produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// System resumed from sleep
    Wake,
    /// Screen/session unlocked
    Unlock,
    /// User session became active
    Login,
    /// Synthetic event fired once when the watcher starts
    Startup,
}

impl SessionEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionEvent::Wake => "wake",
            SessionEvent::Unlock => "unlock",
            SessionEvent::Login => "login",
            SessionEvent::Startup => "startup",
        }
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which delivery mechanism the capability check selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDelivery {
    /// Native OS notifications on a dedicated thread
    EventDriven,
    /// Wall-clock-jump polling; used where no native bridge is available
    /// or the native bridge failed to initialise
    PollingFallback,
}
