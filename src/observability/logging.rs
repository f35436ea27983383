//! # Logging
//!
//! `tracing-subscriber` setup for binaries embedding the client.

use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::error::{Result, SecretManagerError};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` applies to this crate and
/// the `smctl` binary. Output goes to stderr so command output on stdout
/// stays clean.
pub fn init_tracing(config: &ClientConfig) -> Result<()> {
    let level = config.log_level.to_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("secret_manager_client={level},smctl={level}").into());

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };

    result.map_err(|e| SecretManagerError::Config(format!("failed to initialize tracing: {e}")))
}
