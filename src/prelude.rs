//! Common imports for users of the helpers
//!
//! ```rust
//! use secret_manager_client::prelude::*;
//! ```

pub use crate::client::{ClientFactory, RestClientFactory, SecretClient, SecretManagerREST};
pub use crate::config::ClientConfig;
pub use crate::error::{ApiError, Result, SecretManagerError};
pub use crate::model::{Replication, Secret, SecretPayload, SecretVersion, VersionState};
pub use crate::secrets::SecretManager;
