//! HttpTransport - POSTs each payload to the document endpoint

use bytes::Bytes;
use contracts::{ContractError, Transport, TransportSettings};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Configuration for HttpTransport
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Target URL
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// `Content-Type` header value
    pub content_type: String,
}

impl HttpTransportConfig {
    /// Create config from file settings
    pub fn from_settings(settings: &TransportSettings) -> Self {
        Self {
            url: settings.url.clone(),
            timeout: settings.timeout(),
            content_type: settings.content_type.clone(),
        }
    }
}

/// Transport that submits documents over HTTP
///
/// Any non-2xx response is treated as a transport failure.
pub struct HttpTransport {
    name: String,
    config: HttpTransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new HttpTransport
    pub fn new(name: impl Into<String>, config: HttpTransportConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContractError::transport(&name, format!("client build failed: {e}")))?;

        debug!(transport = %name, url = %config.url, "HttpTransport created");

        Ok(Self {
            name,
            config,
            client,
        })
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_transport_send",
        skip(self, payload),
        fields(transport = %self.name, bytes = payload.len())
    )]
    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        let response = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, self.config.content_type.as_str())
            .body(payload)
            .send()
            .await
            .map_err(|e| ContractError::transport(&self.name, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(transport = %self.name, %status, "Document accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(transport = %self.name, %status, "Document rejected");
        Err(ContractError::transport(
            &self.name,
            format!("unexpected status {status}: {body}"),
        ))
    }
}
