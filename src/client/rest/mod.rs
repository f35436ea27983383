//! GCP Secret Manager REST Client
//!
//! Native REST implementation for GCP Secret Manager API v1.
//! Uses reqwest for HTTP requests and OAuth2 bearer tokens for authentication.
//!
//! This implementation:
//! - Works directly with Pact HTTP mock servers
//! - Uses reqwest with rustls (no OpenSSL dependencies)
//! - Maps each [`SecretClient`](super::SecretClient) call to one HTTP request
//!
//! References:
//! - [GCP Secret Manager REST API v1](https://cloud.google.com/secret-manager/docs/reference/rest)

mod auth;
mod operations;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, field, info, info_span, Instrument};

use super::common::OperationTracker;
use super::{ClientFactory, SecretClient};
use crate::config::ClientConfig;
use crate::error::{ApiErrorResponse, Result, SecretManagerError};
use crate::paths::SecretOperation;

/// GCP Secret Manager REST client
pub struct SecretManagerREST {
    http_client: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for SecretManagerREST {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManagerREST")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SecretManagerREST {
    /// Create a new REST client and obtain an access token
    ///
    /// When `pact_mode` is set, uses a static token and the configured
    /// (mock) endpoint.
    pub async fn new(config: &ClientConfig) -> Result<Self> {
        info!(
            "Initializing Secret Manager REST client for project: {}",
            config.project_id
        );
        if config.pact_mode {
            info!("Pact mode enabled: using endpoint {}", config.endpoint);
        }

        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let access_token = auth::get_access_token(config, &http_client).await?;

        Ok(Self::with_token(http_client, &config.endpoint, access_token))
    }

    /// Build a client around an existing HTTP client and token
    pub fn with_token(http_client: Client, base_url: &str, access_token: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build HTTP request with authentication headers
    fn make_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let token = self
            .access_token
            .strip_prefix("Bearer ")
            .unwrap_or(&self.access_token);

        self.http_client
            .request(method, url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
    }

    /// Send a request inside an instrumented span and decode the JSON response
    async fn execute<T>(
        &self,
        operation: SecretOperation,
        resource: &str,
        request: RequestBuilder,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let span = info_span!(
            "gcp.secretmanager.request",
            operation = operation.as_str(),
            resource.name = resource,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(operation, span.clone());

        async move {
            let result = Self::send(request).await;
            match &result {
                Ok(_) => tracker.record_success(),
                Err(e) => {
                    debug!("{} failed for {}: {}", operation.as_str(), resource, e);
                    tracker.record_error(&e.to_string());
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn send<T>(request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, error_text));
        }

        let body = response.bytes().await?;
        // Empty bodies (e.g. google.protobuf.Empty) decode as `{}`
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Handle GCP API error responses
    fn handle_error_response(status: StatusCode, error_text: String) -> SecretManagerError {
        match serde_json::from_str::<ApiErrorResponse>(&error_text) {
            Ok(error_response) => SecretManagerError::Api(error_response.error),
            Err(_) => SecretManagerError::Http {
                status: status.as_u16(),
                body: error_text,
            },
        }
    }
}

/// Builds [`SecretManagerREST`] clients from a [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct RestClientFactory {
    config: ClientConfig,
}

impl RestClientFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClientFactory for RestClientFactory {
    async fn new_secret_client(&self) -> Result<Arc<dyn SecretClient>> {
        self.config.validate()?;
        let client = SecretManagerREST::new(&self.config).await?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_error_body_becomes_api_error() {
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        let err = SecretManagerREST::handle_error_response(StatusCode::FORBIDDEN, body.to_string());
        let api = err.api_error().unwrap();
        assert_eq!(api.code, 403);
        assert_eq!(api.status, "PERMISSION_DENIED");
        assert_eq!(api.message, "Permission denied");
    }

    #[test]
    fn test_plain_error_body_becomes_http_error() {
        let err = SecretManagerREST::handle_error_response(
            StatusCode::BAD_GATEWAY,
            "upstream unavailable".to_string(),
        );
        match err {
            SecretManagerError::Http { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SecretManagerREST::with_token(
            Client::new(),
            "http://localhost:1234/",
            "test-token".to_string(),
        );
        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}
