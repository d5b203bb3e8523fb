//! HTTP client for the study-session telemetry service.
//!
//! This module wraps the service's dashboard, session-list and session
//! control endpoints. Each call is a single request: retries are the polling
//! engine's business, not the client's.

use crate::core::{Analysis, SessionCatalog, SessionId, SessionSnapshot};
use crate::polling::SnapshotSource;
use chrono_tz::Tz;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Default address of the telemetry service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8085";

/// Service endpoint configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without a trailing slash
    base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a new endpoint configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the base URL.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.base_url)
    }

    pub fn session_list_url(&self) -> String {
        format!("{}/api/sessionlist", self.base_url)
    }

    pub fn session_start_url(&self) -> String {
        format!("{}/api/session/start", self.base_url)
    }

    pub fn session_stop_url(&self) -> String {
        format!("{}/api/session/stop", self.base_url)
    }

    pub fn capture_url(&self) -> String {
        format!("{}/api/capture/once", self.base_url)
    }

    /// Route a selection to its snapshot endpoint.
    ///
    /// The live session reads the monolithic state; a historical one is looked
    /// up by its exact identifier, URL-encoded into the `datetime` parameter.
    pub fn snapshot_url(&self, session: &SessionId) -> Result<Url, ClientError> {
        let parsed = match session.query_value() {
            None => Url::parse(&format!("{}/api/dash/monolithic", self.base_url)),
            Some(datetime) => Url::parse_with_params(
                &format!("{}/api/dash/session", self.base_url),
                &[("datetime", datetime)],
            ),
        };
        parsed.map_err(|e| ClientError::Config(format!("Invalid base URL '{}': {e}", self.base_url)))
    }

    /// Resolve a possibly relative path (such as `/images/latest.jpg`) against the base URL.
    pub fn resolve(&self, path: &str) -> Option<String> {
        let base = Url::parse(&self.base_url).ok()?;
        base.join(path).ok().map(String::from)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Client error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Configuration error
    Config(String),
    /// Transport failure (connect, timeout, reset)
    Network(String),
    /// Server returned a non-success status
    Server { status: u16, message: String },
    /// Response body was not the expected JSON
    Parse(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Config(msg) => write!(f, "Client config error: {msg}"),
            ClientError::Network(msg) => write!(f, "Network error: {msg}"),
            ClientError::Server { status, message } => {
                write!(f, "Server error ({status}): {message}")
            }
            ClientError::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Async client for the telemetry service.
#[derive(Debug, Clone)]
pub struct DashClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl DashClient {
    /// Create a new client.
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Test connection to the service.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Raw historical session identifiers as published by the service.
    pub async fn session_list(&self) -> Result<Vec<String>, ClientError> {
        let request = self.client.get(self.config.session_list_url());
        let list: Option<Vec<String>> = Self::read_json(request).await?;
        Ok(list.unwrap_or_default())
    }

    /// Load the session catalog.
    ///
    /// A failed load degrades to an empty catalog: historical browsing is
    /// unavailable but the live session keeps working.
    pub async fn load_catalog(&self, timezone: Tz) -> SessionCatalog {
        match self.session_list().await {
            Ok(raw) => {
                let catalog = SessionCatalog::from_raw(raw, timezone);
                tracing::info!(
                    "Loaded {} historical sessions across {} dates",
                    catalog.len(),
                    catalog.dates().count()
                );
                catalog
            }
            Err(e) => {
                tracing::warn!("Session list unavailable, continuing without history: {}", e);
                SessionCatalog::empty(timezone)
            }
        }
    }

    /// Fetch the current snapshot for a session.
    pub async fn fetch_snapshot(&self, session: &SessionId) -> Result<SessionSnapshot, ClientError> {
        let url = self.config.snapshot_url(session)?;
        Self::read_json(self.client.get(url)).await
    }

    /// Begin a new capture session on the service.
    pub async fn start_session(&self) -> Result<(), ClientError> {
        self.post_ok(self.config.session_start_url()).await
    }

    /// End the running capture session.
    pub async fn stop_session(&self) -> Result<(), ClientError> {
        self.post_ok(self.config.session_stop_url()).await
    }

    /// Trigger one immediate capture and return its analysis.
    pub async fn capture_once(&self) -> Result<Analysis, ClientError> {
        Self::read_json(self.client.post(self.config.capture_url())).await
    }

    /// Absolute URL of the snapshot's latest image, if it has one.
    pub fn image_url(&self, snapshot: &SessionSnapshot) -> Option<String> {
        snapshot
            .last_image_url
            .as_deref()
            .and_then(|path| self.config.resolve(path))
    }

    async fn post_ok(&self, url: String) -> Result<(), ClientError> {
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn read_json<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

impl SnapshotSource for DashClient {
    fn fetch(
        &self,
        session: &SessionId,
    ) -> impl Future<Output = Result<SessionSnapshot, ClientError>> + Send {
        self.fetch_snapshot(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_urls() {
        let config = ApiConfig::new("http://127.0.0.1:8085/");
        assert_eq!(config.url(), "http://127.0.0.1:8085");
        assert_eq!(config.health_url(), "http://127.0.0.1:8085/api/health");
        assert_eq!(config.session_list_url(), "http://127.0.0.1:8085/api/sessionlist");
        assert_eq!(config.session_start_url(), "http://127.0.0.1:8085/api/session/start");
        assert_eq!(config.session_stop_url(), "http://127.0.0.1:8085/api/session/stop");
    }

    #[test]
    fn test_live_routes_to_monolithic() {
        let config = ApiConfig::new("http://127.0.0.1:8085");
        let url = config.snapshot_url(&SessionId::Live).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8085/api/dash/monolithic");
    }

    #[test]
    fn test_historical_routes_with_encoded_datetime() {
        let config = ApiConfig::new("http://127.0.0.1:8085");
        let id: SessionId = "2024-05-01T08:00:00+02:00".parse().unwrap();
        let url = config.snapshot_url(&id).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8085/api/dash/session?datetime=2024-05-01T08%3A00%3A00%2B02%3A00"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = ApiConfig::new("not a url");
        assert!(matches!(
            config.snapshot_url(&SessionId::Live),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_resolve_relative_image_path() {
        let config = ApiConfig::new("http://127.0.0.1:8085");
        assert_eq!(
            config.resolve("/images/latest.jpg").as_deref(),
            Some("http://127.0.0.1:8085/images/latest.jpg")
        );
        assert_eq!(
            config.resolve("http://cdn.example/x.jpg").as_deref(),
            Some("http://cdn.example/x.jpg")
        );
    }

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Server {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (503): busy");
    }
}
