//! # Constants
//!
//! Shared constants used throughout the client.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Production Secret Manager REST endpoint
pub const DEFAULT_SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// REST API version prefix
pub const API_VERSION: &str = "v1";

/// Version alias that resolves to the newest enabled version
pub const LATEST_VERSION: &str = "latest";

/// Default metadata server host (GCE/GKE Workload Identity)
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Metadata server token path for the default service account
pub const METADATA_TOKEN_PATH: &str =
    "/computeMetadata/v1/instance/service-accounts/default/token";

/// Access token used when routing to a Pact mock server
pub const PACT_MODE_ACCESS_TOKEN: &str = "test-token";

/// Default page size for list calls (0 lets the server decide)
pub const DEFAULT_PAGE_SIZE: u32 = 0;

/// Maximum page size accepted by the API
pub const MAX_PAGE_SIZE: u32 = 25_000;

/// Default HTTP request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
