// Check-in client module
// Daily gate, retry protocol, and the state they persist

pub mod client;
pub mod config;
pub mod http;
pub mod marker;
