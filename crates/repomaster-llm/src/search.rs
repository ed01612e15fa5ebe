//! Serper and Jina connectivity probes

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::util::sanitize_api_error;

/// Serper web search endpoint
pub const SERPER_URL: &str = "https://google.serper.dev/search";

/// Jina reader endpoint; the target URL is appended
pub const JINA_READER_URL: &str = "https://r.jina.ai/";

/// Page fetched through Jina by the probe
const JINA_PROBE_TARGET: &str = "https://example.com";

/// Result of probing one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    /// No key configured
    Skipped,
    /// Request succeeded
    Ok,
    /// Key refused (401/403)
    Rejected(u16),
    /// Any other failure
    Failed(String),
}

impl ServiceStatus {
    /// Map an HTTP status to a probe result
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            Self::Ok
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Rejected(status.as_u16())
        } else {
            Self::Failed(format!("HTTP {status}"))
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped (no key configured)"),
            Self::Ok => f.write_str("reachable"),
            Self::Rejected(code) => write!(f, "key rejected (HTTP {code})"),
            Self::Failed(detail) => write!(f, "failed: {detail}"),
        }
    }
}

/// HTTP probes for the optional search services
pub struct SearchProbe {
    client: Client,
    serper_url: String,
    jina_url: String,
}

impl SearchProbe {
    /// Probe client with a request timeout
    ///
    /// # Errors
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            client,
            serper_url: SERPER_URL.to_string(),
            jina_url: JINA_READER_URL.to_string(),
        })
    }

    /// Point the probes at other endpoints
    #[must_use]
    pub fn with_endpoints(mut self, serper_url: impl Into<String>, jina_url: impl Into<String>) -> Self {
        self.serper_url = serper_url.into();
        self.jina_url = jina_url.into();
        self
    }

    /// One-result Serper search
    pub async fn serper(&self, api_key: Option<&str>) -> ServiceStatus {
        let Some(key) = api_key else {
            return ServiceStatus::Skipped;
        };
        debug!(url = %self.serper_url, "Probing Serper");
        let result = self
            .client
            .post(&self.serper_url)
            .header("X-API-KEY", key)
            .json(&json!({ "q": "RepoMaster", "num": 1 }))
            .send()
            .await;
        Self::status_of(result, key)
    }

    /// Fetch a page through the Jina reader
    pub async fn jina(&self, api_key: Option<&str>) -> ServiceStatus {
        let Some(key) = api_key else {
            return ServiceStatus::Skipped;
        };
        let url = format!("{}{}", self.jina_url, JINA_PROBE_TARGET);
        debug!(%url, "Probing Jina");
        let result = self.client.get(&url).bearer_auth(key).send().await;
        Self::status_of(result, key)
    }

    fn status_of(result: reqwest::Result<reqwest::Response>, key: &str) -> ServiceStatus {
        match result {
            Ok(response) => ServiceStatus::from_status(response.status()),
            Err(e) => ServiceStatus::Failed(sanitize_api_error(&e.to_string(), Some(key))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceStatus::from_status(StatusCode::OK), ServiceStatus::Ok);
        assert_eq!(
            ServiceStatus::from_status(StatusCode::FORBIDDEN),
            ServiceStatus::Rejected(403)
        );
        assert!(matches!(
            ServiceStatus::from_status(StatusCode::BAD_GATEWAY),
            ServiceStatus::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_keys_are_skipped() {
        let probe = SearchProbe::new(Duration::from_secs(1)).unwrap();
        assert_eq!(probe.serper(None).await, ServiceStatus::Skipped);
        assert_eq!(probe.jina(None).await, ServiceStatus::Skipped);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let probe = SearchProbe::new(Duration::from_secs(2))
            .unwrap()
            .with_endpoints("http://127.0.0.1:9/search", "http://127.0.0.1:9/");
        let status = probe.serper(Some("serper-key-123456")).await;
        match status {
            ServiceStatus::Failed(detail) => assert!(!detail.contains("serper-key-123456")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
