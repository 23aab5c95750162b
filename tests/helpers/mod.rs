// Shared between integration test crates; each compiles only what it uses
#![allow(dead_code)]

pub mod http;

use std::path::Path;
use std::time::{Duration, Instant};

/// Poll until `path` exists and `check` accepts its content, or time out.
pub fn wait_for_file_content(
    path: &Path,
    check: impl Fn(&str) -> bool,
    timeout: Duration,
) -> Result<String, String> {
    let start = Instant::now();
    let mut delay = Duration::from_millis(50);

    loop {
        if let Ok(content) = std::fs::read_to_string(path) {
            if check(&content) {
                return Ok(content);
            }
        }
        if start.elapsed() >= timeout {
            return Err(format!(
                "timed out after {:?} waiting for {}",
                timeout,
                path.display()
            ));
        }
        std::thread::sleep(delay);
        delay = (delay * 2).min(Duration::from_millis(500));
    }
}
