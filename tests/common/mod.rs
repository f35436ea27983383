//! Common test utilities for integration tests
//!
//! Provides rustls crypto provider setup and the client configuration used
//! against Pact mock servers.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use std::sync::Once;

use secret_manager_client::config::ClientConfig;

static RUSTLS_INIT: Once = Once::new();

pub const TEST_PROJECT: &str = "test-project";

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // Another test binary sharing the process may have installed it already
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Mock server URL without the trailing slash
pub fn base_url(url: impl ToString) -> String {
    url.to_string().trim_end_matches('/').to_string()
}

/// Client configuration routed to a Pact mock server
pub fn pact_config(base_url: &str) -> ClientConfig {
    ClientConfig::default()
        .with_project(TEST_PROJECT)
        .with_endpoint(base_url)
        .with_pact_mode(true)
}
