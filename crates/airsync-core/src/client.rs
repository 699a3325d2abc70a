//! HTTP client for the telemetry service REST API.
//!
//! # Example
//!
//! ```no_run
//! use airsync_core::ServiceClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ServiceClient::new("http://localhost:8080")?;
//!
//! let status = client.status().await?;
//! println!("CO2: {} ppm", status.last_data.co2);
//!
//! let history = client.history(6).await?;
//! println!("{} readings in the last 6h", history.count);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use airsync_types::{
    AnalysisPayload, AnalysisSnapshot, HistoryBatch, StatsPayload, StatsSnapshot, StatusResponse,
};

use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::traits::SensorApi;

/// Prefix under which the service mounts its endpoints.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// HTTP client for the telemetry service API.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
    api_prefix: String,
}

/// Builder for [`ServiceClient`].
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder {
    base_url: String,
    api_prefix: String,
    timeout: Option<Duration>,
    client: Option<Client>,
}

impl ServiceClientBuilder {
    /// Set the API prefix (default `/api`). An empty prefix mounts the
    /// endpoints at the root.
    #[must_use]
    pub fn api_prefix(mut self, prefix: &str) -> Self {
        self.api_prefix = normalize_prefix(prefix);
        self
    }

    /// Set a per-request timeout. No timeout is applied by default.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured reqwest client. Overrides [`timeout`](Self::timeout).
    #[must_use]
    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ServiceClient> {
        let base_url = self.base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(Error::Request)?
            }
        };

        Ok(ServiceClient {
            client,
            base_url,
            api_prefix: self.api_prefix,
        })
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

impl ServiceClient {
    /// Create a client with the default `/api` prefix and no timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Where the service listens (e.g., "http://localhost:8080")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Start configuring a client.
    pub fn builder(base_url: &str) -> ServiceClientBuilder {
        ServiceClientBuilder {
            base_url: base_url.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: None,
            client: None,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a resource endpoint, without query parameters.
    pub fn endpoint(&self, resource: Resource) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, resource.path())
    }

    /// Get the most recent reading.
    pub async fn status(&self) -> Result<StatusResponse> {
        self.get(Resource::Status, None).await
    }

    /// Get raw readings from the last `hours`, newest first.
    pub async fn history(&self, hours: u32) -> Result<HistoryBatch> {
        self.get(Resource::History, Some(hours)).await
    }

    /// Get per-channel statistics over the last `hours`.
    ///
    /// An empty window is reported as [`Error::NoData`].
    pub async fn stats(&self, hours: u32) -> Result<StatsSnapshot> {
        match self.get(Resource::Stats, Some(hours)).await? {
            StatsPayload::Snapshot(snapshot) => Ok(snapshot),
            StatsPayload::Empty(empty) => Err(Error::NoData {
                resource: Resource::Stats,
                message: empty.message,
            }),
        }
    }

    /// Get the derived analysis over the last `hours`.
    ///
    /// An empty window is reported as [`Error::NoData`].
    pub async fn analysis(&self, hours: u32) -> Result<AnalysisSnapshot> {
        match self.get(Resource::Analysis, Some(hours)).await? {
            AnalysisPayload::Snapshot(snapshot) => Ok(*snapshot),
            AnalysisPayload::Empty(empty) => Err(Error::NoData {
                resource: Resource::Analysis,
                message: empty.message,
            }),
        }
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn get<T: DeserializeOwned>(&self, resource: Resource, hours: Option<u32>) -> Result<T> {
        let url = self.endpoint(resource);
        let mut request = self.client.get(&url);
        if let Some(hours) = hours {
            request = request.query(&[("hours", hours)]);
        }

        debug!("GET {} (hours={:?})", url, hours);
        let response = request.send().await.map_err(|e| Error::NotReachable {
            url: url.clone(),
            source: e,
        })?;

        self.handle_response(resource, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resource: Resource,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await.map_err(Error::Request)?;

        if status.is_success() {
            serde_json::from_slice(&body).map_err(|source| Error::Decode { resource, source })
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&body, status),
            })
        }
    }
}

/// Pull a readable message out of an error body: a JSON `error` field, the
/// plain-text body, or the status line.
fn error_message(body: &[u8], status: reqwest::StatusCode) -> String {
    if let Some(message) = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
    {
        return message;
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status.to_string()
    } else {
        text.to_string()
    }
}

#[async_trait]
impl SensorApi for ServiceClient {
    async fn status(&self) -> Result<StatusResponse> {
        ServiceClient::status(self).await
    }

    async fn history(&self, hours: u32) -> Result<HistoryBatch> {
        ServiceClient::history(self, hours).await
    }

    async fn stats(&self, hours: u32) -> Result<StatsSnapshot> {
        ServiceClient::stats(self, hours).await
    }

    async fn analysis(&self, hours: u32) -> Result<AnalysisSnapshot> {
        ServiceClient::analysis(self, hours).await
    }

    fn source(&self) -> &str {
        &self.base_url
    }
}
