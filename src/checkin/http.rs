// HTTP transport for the check-in protocol

use crate::checkin::config::CheckinConfig;
use anyhow::{Context, Result};
use serde::Serialize;

/// Payload POSTed to `<server.url>/checkin`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinRequest {
    pub hostname: String,
    /// Local issue time, ISO-8601 with offset
    pub client_time: String,
    pub version: String,
}

impl CheckinRequest {
    pub fn new(version: &str) -> Self {
        Self {
            hostname: short_hostname(),
            client_time: chrono::Local::now().to_rfc3339(),
            version: version.to_string(),
        }
    }
}

/// How the server answered one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinStatus {
    /// 200: fresh check-in accepted
    Accepted,
    /// 208: server already has a check-in for today; success for our purposes
    AlreadyRecorded,
    /// Anything else; retryable
    Rejected(u16),
}

impl CheckinStatus {
    pub fn is_success(self) -> bool {
        matches!(self, CheckinStatus::Accepted | CheckinStatus::AlreadyRecorded)
    }
}

/// Thin wrapper around a reqwest client pinned to one check-in endpoint
/// and one per-attempt timeout.
pub struct CheckinTransport {
    client: reqwest::Client,
    url: String,
}

impl CheckinTransport {
    pub fn new(config: &CheckinConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let url = format!("{}/checkin", config.server.url.trim_end_matches('/'));

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one check-in attempt. Transport failures (refused connection,
    /// timeout, closed socket) surface as `Err`; any HTTP response, even an
    /// error status, is `Ok` with its classification.
    pub async fn post(&self, request: &CheckinRequest) -> reqwest::Result<CheckinStatus> {
        let response = self.client.post(&self.url).json(request).send().await?;

        Ok(match response.status().as_u16() {
            200 => CheckinStatus::Accepted,
            208 => CheckinStatus::AlreadyRecorded,
            other => CheckinStatus::Rejected(other),
        })
    }
}

/// Hostname up to the first dot, matching what the server keys check-ins on.
pub fn short_hostname() -> String {
    sysinfo::System::host_name()
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> CheckinConfig {
        serde_json::from_str(&format!(
            r#"{{ "server": {{ "url": "{}", "timeout_seconds": 2 }} }}"#,
            url
        ))
        .unwrap()
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let transport = CheckinTransport::new(&config_with_url("http://x:1/")).unwrap();
        assert_eq!(transport.url(), "http://x:1/checkin");

        let transport = CheckinTransport::new(&config_with_url("http://x:1")).unwrap();
        assert_eq!(transport.url(), "http://x:1/checkin");
    }

    #[test]
    fn status_classification() {
        assert!(CheckinStatus::Accepted.is_success());
        assert!(CheckinStatus::AlreadyRecorded.is_success());
        assert!(!CheckinStatus::Rejected(500).is_success());
        assert!(!CheckinStatus::Rejected(404).is_success());
    }

    #[test]
    fn request_carries_version_and_parseable_time() {
        let request = CheckinRequest::new("1.2.3");
        assert_eq!(request.version, "1.2.3");
        assert!(chrono::DateTime::parse_from_rfc3339(&request.client_time).is_ok());
    }

    #[test]
    fn payload_shape() {
        let request = CheckinRequest {
            hostname: "host-a".to_string(),
            client_time: "2026-08-07T09:00:00+02:00".to_string(),
            version: "1.0.0".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["hostname"], "host-a");
        assert_eq!(json["client_time"], "2026-08-07T09:00:00+02:00");
        assert_eq!(json["version"], "1.0.0");
    }
}
