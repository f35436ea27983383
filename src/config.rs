//! # Client Configuration
//!
//! Settings loaded from environment variables.
//!
//! The owning project is the one piece of configuration every helper needs;
//! the rest tunes the REST transport and logging.

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::constants::{
    DEFAULT_METADATA_HOST, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SECRET_MANAGER_ENDPOINT, MAX_PAGE_SIZE,
};
use crate::error::{Result, SecretManagerError};
use crate::model::Replication;
use crate::paths::validate_project_id;

/// Client configuration
///
/// All settings except the project id have defaults and can be overridden
/// via environment variables.
#[derive(Clone)]
pub struct ClientConfig {
    /// Project that owns the secrets (`GCP_PROJECT_ID`, falls back to `GOOGLE_CLOUD_PROJECT`)
    pub project_id: String,
    /// Secret Manager endpoint (`GCP_SECRET_MANAGER_ENDPOINT`)
    pub endpoint: String,
    /// Route to a Pact mock server with a static token (`PACT_MODE`)
    pub pact_mode: bool,
    /// Pre-obtained OAuth2 access token (`GCP_ACCESS_TOKEN`)
    pub access_token: Option<String>,
    /// Metadata server host for Workload Identity (`GCE_METADATA_HOST`)
    pub metadata_host: String,
    /// Replica locations for new secrets; empty means automatic replication
    /// (`SECRET_MANAGER_REPLICA_LOCATIONS`, comma separated)
    pub replica_locations: Vec<String>,
    /// Page size for list calls (`SECRET_MANAGER_PAGE_SIZE`)
    pub page_size: u32,
    /// HTTP request timeout in seconds (`SECRET_MANAGER_TIMEOUT_SECS`)
    pub request_timeout_secs: u64,
    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE) (`LOG_LEVEL`)
    pub log_level: String,
    /// Log format (json, text) (`LOG_FORMAT`)
    pub log_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            endpoint: DEFAULT_SECRET_MANAGER_ENDPOINT.to_string(),
            pact_mode: false,
            access_token: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
            replica_locations: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("project_id", &self.project_id)
            .field("endpoint", &self.endpoint)
            .field("pact_mode", &self.pact_mode)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("metadata_host", &self.metadata_host)
            .field("replica_locations", &self.replica_locations)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let project_id = lookup("GCP_PROJECT_ID")
            .or_else(|| lookup("GOOGLE_CLOUD_PROJECT"))
            .unwrap_or_default();

        Self {
            project_id: project_id.trim().to_string(),
            endpoint: lookup("GCP_SECRET_MANAGER_ENDPOINT")
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or(defaults.endpoint),
            pact_mode: var_or_default_bool(&lookup, "PACT_MODE", false),
            access_token: lookup("GCP_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
            metadata_host: lookup("GCE_METADATA_HOST").unwrap_or(defaults.metadata_host),
            replica_locations: lookup("SECRET_MANAGER_REPLICA_LOCATIONS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            page_size: var_or_default(&lookup, "SECRET_MANAGER_PAGE_SIZE", defaults.page_size),
            request_timeout_secs: var_or_default(
                &lookup,
                "SECRET_MANAGER_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_pact_mode(mut self, enabled: bool) -> Self {
        self.pact_mode = enabled;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Replication policy applied to newly created secrets
    pub fn replication(&self) -> Replication {
        if self.replica_locations.is_empty() {
            Replication::automatic()
        } else {
            Replication::user_managed(self.replica_locations.iter().cloned())
        }
    }

    /// Check the configuration before building a client
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_empty() {
            return Err(SecretManagerError::Config(
                "project id is not set. Set GCP_PROJECT_ID or pass --project".to_string(),
            ));
        }
        validate_project_id(&self.project_id)?;

        if self.page_size > MAX_PAGE_SIZE {
            return Err(SecretManagerError::Config(format!(
                "page size {} exceeds maximum of {MAX_PAGE_SIZE}",
                self.page_size
            )));
        }

        if self.pact_mode {
            self.validate_pact_endpoint()?;
        }

        Ok(())
    }

    fn validate_pact_endpoint(&self) -> Result<()> {
        if self.endpoint.contains("secretmanager.googleapis.com") {
            return Err(SecretManagerError::Config(format!(
                "PACT_MODE enabled but endpoint '{}' points to production GCP. \
                Use a mock server endpoint instead.",
                self.endpoint
            )));
        }

        let looks_like_mock = self.endpoint.starts_with("http://localhost")
            || self.endpoint.starts_with("http://127.0.0.1")
            || self.endpoint.starts_with("http://[::1]")
            || self.endpoint.contains("pact")
            || self.endpoint.contains("mock");

        if !looks_like_mock {
            warn!(
                "PACT_MODE enabled but endpoint '{}' does not appear to be a mock server",
                self.endpoint
            );
        }

        Ok(())
    }
}

/// Read a value or return default
fn var_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a value as boolean or return default
fn var_or_default_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert!(config.project_id.is_empty());
        assert_eq!(config.endpoint, DEFAULT_SECRET_MANAGER_ENDPOINT);
        assert!(!config.pact_mode);
        assert_eq!(config.replication(), Replication::automatic());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reads_environment() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("GOOGLE_CLOUD_PROJECT", "fallback-project"),
            ("GCP_SECRET_MANAGER_ENDPOINT", "http://localhost:1234/"),
            ("PACT_MODE", "TRUE"),
            ("SECRET_MANAGER_REPLICA_LOCATIONS", "us-east1, europe-west1,"),
            ("SECRET_MANAGER_PAGE_SIZE", "50"),
            ("SECRET_MANAGER_TIMEOUT_SECS", "not-a-number"),
        ]));
        assert_eq!(config.project_id, "fallback-project");
        assert_eq!(config.endpoint, "http://localhost:1234");
        assert!(config.pact_mode);
        assert_eq!(config.replica_locations, vec!["us-east1", "europe-west1"]);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pact_mode_refuses_production_endpoint() {
        let config = ClientConfig::default()
            .with_project("test-project")
            .with_pact_mode(true);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("production GCP"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::from_lookup(lookup(&[("GCP_ACCESS_TOKEN", "ya29.secret")]));
        assert!(!format!("{config:?}").contains("ya29.secret"));
    }
}
