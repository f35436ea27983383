//! # Secret Manager Clients
//!
//! The seam between the helper layer and the remote service.
//!
//! [`SecretClient`] mirrors the Secret Manager calls one to one. The helpers in
//! [`crate::secrets`] only ever talk to a `dyn SecretClient`, so the real
//! client can be replaced with a test double:
//!
//! - **REST Client** ([`SecretManagerREST`]): native REST implementation using reqwest
//! - **Mock Client** ([`MockSecretClient`]): in-memory double that records requests

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    AccessSecretVersionRequest, AccessSecretVersionResponse, AddSecretVersionRequest,
    CreateSecretRequest, DeleteSecretRequest, DestroySecretVersionRequest,
    DisableSecretVersionRequest, EnableSecretVersionRequest, GetSecretRequest,
    GetSecretVersionRequest, ListSecretVersionsRequest, ListSecretVersionsResponse,
    ListSecretsRequest, ListSecretsResponse, Secret, SecretVersion,
};

pub mod common;
pub mod mock;
pub mod rest;

pub use mock::{MockClientFactory, MockSecretClient, RecordedCall, SecretMethod};
pub use rest::{RestClientFactory, SecretManagerREST};

/// Secret Manager API surface used by the helpers
///
/// Implementations forward each request to the service and hand back its
/// response or error without reinterpreting it.
#[async_trait]
pub trait SecretClient: Send + Sync {
    async fn access_secret_version(
        &self,
        req: &AccessSecretVersionRequest,
    ) -> Result<AccessSecretVersionResponse>;

    /// One page of versions; follow `next_page_token` for the rest
    async fn list_secret_versions(
        &self,
        req: &ListSecretVersionsRequest,
    ) -> Result<ListSecretVersionsResponse>;

    async fn destroy_secret_version(
        &self,
        req: &DestroySecretVersionRequest,
    ) -> Result<SecretVersion>;

    async fn create_secret(&self, req: &CreateSecretRequest) -> Result<Secret>;

    async fn add_secret_version(&self, req: &AddSecretVersionRequest) -> Result<SecretVersion>;

    async fn delete_secret(&self, req: &DeleteSecretRequest) -> Result<()>;

    async fn get_secret(&self, req: &GetSecretRequest) -> Result<Secret>;

    /// One page of secrets; follow `next_page_token` for the rest
    async fn list_secrets(&self, req: &ListSecretsRequest) -> Result<ListSecretsResponse>;

    async fn get_secret_version(&self, req: &GetSecretVersionRequest) -> Result<SecretVersion>;

    async fn disable_secret_version(
        &self,
        req: &DisableSecretVersionRequest,
    ) -> Result<SecretVersion>;

    async fn enable_secret_version(
        &self,
        req: &EnableSecretVersionRequest,
    ) -> Result<SecretVersion>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Creates [`SecretClient`]s; the real factory in normal use, a mock in tests
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn new_secret_client(&self) -> Result<Arc<dyn SecretClient>>;
}
