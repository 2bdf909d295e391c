//! reqwest-backed transport for the analytics service.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{AnalyticsBackend, ApiRequest, domain_error_message};
use crate::config::ApiConfig;
use crate::error::{ExplorerError, Result};

/// HTTP/JSON backend talking to a live analytics service.
pub struct HttpBackend {
    client: Client,
    api: ApiConfig,
}

impl HttpBackend {
    /// Build a backend with the configured per-request timeout.
    pub fn new(api: ApiConfig) -> Result<Self> {
        api.validate()?;
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| ExplorerError::Transport {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, api })
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    fn map_send_error(&self, err: reqwest::Error) -> ExplorerError {
        if err.is_timeout() {
            ExplorerError::Timeout {
                timeout_secs: self.api.timeout_secs,
            }
        } else {
            ExplorerError::Transport {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl AnalyticsBackend for HttpBackend {
    async fn get(&self, request: &ApiRequest) -> Result<Value> {
        let url = self.api.url_for(&request.path_and_query(&self.api));
        debug!(url = url.as_str(), "Sending analytics request");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            // Validation failures come back as 4xx with {"error": "..."}.
            if let Some(message) = serde_json::from_str::<Value>(&body_text)
                .ok()
                .as_ref()
                .and_then(domain_error_message)
            {
                debug!(status = status.as_u16(), message = message.as_str(), "Domain error");
                return Err(ExplorerError::Domain { message });
            }
            warn!(status = status.as_u16(), url = url.as_str(), "Analytics request failed");
            return Err(ExplorerError::Transport {
                message: format!("HTTP {} from {}", status, url),
            });
        }

        serde_json::from_str(&body_text).map_err(|e| ExplorerError::Decode {
            message: format!("{}: {}", request.describe(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpBackend::new(api),
            Err(ExplorerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on loopback is closed on CI hosts.
        let api = ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let backend = HttpBackend::new(api).unwrap();
        let err = backend.get(&ApiRequest::GlobalStats).await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err:?}");
    }
}
