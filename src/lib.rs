// Shared library for the attendance-tracker and power-monitor binaries.

#[cfg(target_os = "macos")]
#[macro_use]
extern crate objc;

// Check-in client (daily gate + retry protocol)
pub mod checkin;

// Session-event watcher (event bridge + launch gate)
pub mod watcher;

// Application directories and well-known file locations
pub mod paths;

// Tracing subscriber setup (shared between both binaries)
pub mod logging;
