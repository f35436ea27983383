//! Access token resolution
//!
//! Tokens are resolved once when the client is built:
//! 1. Pact mode: a static token accepted by the mock server
//! 2. `GCP_ACCESS_TOKEN`: a pre-obtained OAuth2 token
//! 3. The GCE/GKE metadata server (Workload Identity)

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::constants::{METADATA_TOKEN_PATH, PACT_MODE_ACCESS_TOKEN};
use crate::error::{Result, SecretManagerError};

/// Token response from the metadata server
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

pub(super) async fn get_access_token(config: &ClientConfig, http_client: &Client) -> Result<String> {
    if config.pact_mode {
        debug!("Pact mode: using dummy access token");
        return Ok(PACT_MODE_ACCESS_TOKEN.to_string());
    }

    if let Some(token) = &config.access_token {
        debug!("Using access token from GCP_ACCESS_TOKEN");
        return Ok(token.trim().to_string());
    }

    fetch_metadata_token(&config.metadata_host, http_client).await
}

async fn fetch_metadata_token(metadata_host: &str, http_client: &Client) -> Result<String> {
    let metadata_url = format!("http://{metadata_host}{METADATA_TOKEN_PATH}");

    let response = http_client
        .get(&metadata_url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| {
            debug!("Metadata server not available: {}", e);
            SecretManagerError::Auth(format!(
                "metadata server at {metadata_host} is not reachable. Ensure:\n\
                1. Running in GKE/GCE with Workload Identity enabled, OR\n\
                2. GCP_ACCESS_TOKEN is set"
            ))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("Metadata server returned status {}: {}", status, body);
        return Err(SecretManagerError::Auth(format!(
            "metadata server returned status {status}"
        )));
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        SecretManagerError::Auth(format!(
            "failed to parse token response from metadata server: {e}"
        ))
    })?;
    info!(
        "Retrieved access token from metadata server (Workload Identity), expires in {}s",
        token.expires_in
    );
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pact_mode_uses_static_token() {
        let config = ClientConfig::default()
            .with_project("test-project")
            .with_pact_mode(true);
        let token = get_access_token(&config, &Client::new()).await.unwrap();
        assert_eq!(token, PACT_MODE_ACCESS_TOKEN);
    }

    #[tokio::test]
    async fn test_explicit_token_wins_over_metadata() {
        let mut config = ClientConfig::default().with_project("test-project");
        config.access_token = Some(" ya29.token \n".to_string());
        config.metadata_host = "127.0.0.1:1".to_string();
        let token = get_access_token(&config, &Client::new()).await.unwrap();
        assert_eq!(token, "ya29.token");
    }

    #[tokio::test]
    async fn test_unreachable_metadata_server_is_auth_error() {
        let mut config = ClientConfig::default().with_project("test-project");
        config.metadata_host = "127.0.0.1:1".to_string();
        let err = get_access_token(&config, &Client::new()).await.unwrap_err();
        assert!(matches!(err, SecretManagerError::Auth(_)));
    }

    #[test]
    fn test_token_response_parses() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.abc","expires_in":3599,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "ya29.abc");
        assert_eq!(token.expires_in, 3599);
    }
}
