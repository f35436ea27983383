//! Google Cloud Secret Manager Client Library
//!
//! CRUD helpers over Secret Manager secrets and versions for a single project.
//!
//! The helpers in [`secrets`] talk to the service through the [`client::SecretClient`]
//! trait. [`client::SecretManagerREST`] implements it over the REST API;
//! [`client::MockSecretClient`] is an in-memory double for tests.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod observability;
pub mod paths;
pub mod prelude;
pub mod secrets;

pub use error::{Result, SecretManagerError};
pub use secrets::SecretManager;
