//! # Secret Helpers
//!
//! High-level operations over a [`SecretClient`] for a single project.
//!
//! Each helper builds one request (two for creation), forwards it and hands
//! back the service's response. Failures are logged and returned unchanged;
//! the only error raised here is [`SecretManagerError::AlreadyExists`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use secret_manager_client::client::MockSecretClient;
//! use secret_manager_client::secrets::SecretManager;
//!
//! # async fn demo() -> secret_manager_client::error::Result<()> {
//! let manager = SecretManager::new(Arc::new(MockSecretClient::new()), "my-project");
//! manager.create_secret_with_data("db-password", b"hunter2").await?;
//! let payload = manager.get_secret("db-password", "").await?;
//! assert_eq!(payload.data(), b"hunter2");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::client::{ClientFactory, SecretClient};
use crate::config::ClientConfig;
use crate::error::{Result, SecretManagerError};
use crate::model::{
    AccessSecretVersionRequest, AddSecretVersionRequest, CreateSecretRequest, DeleteSecretRequest,
    DestroySecretVersionRequest, DisableSecretVersionRequest, EnableSecretVersionRequest,
    GetSecretRequest, GetSecretVersionRequest, ListSecretVersionsRequest, ListSecretsRequest,
    Replication, Secret, SecretPayload, SecretVersion,
};
use crate::paths::{PathBuilder, SecretOperation};

/// Secret operations bound to one project
#[derive(Clone)]
pub struct SecretManager {
    client: Arc<dyn SecretClient>,
    project_id: String,
    replication: Replication,
    page_size: u32,
}

impl std::fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManager")
            .field("project_id", &self.project_id)
            .field("replication", &self.replication)
            .finish_non_exhaustive()
    }
}

impl SecretManager {
    /// Helpers over `client` for `project_id`, with automatic replication
    pub fn new(client: Arc<dyn SecretClient>, project_id: impl Into<String>) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            replication: Replication::automatic(),
            page_size: 0,
        }
    }

    /// Build a client with `factory` and apply the project, replication and paging settings
    pub async fn connect(factory: &dyn ClientFactory, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = factory.new_secret_client().await?;
        Ok(Self::new(client, config.project_id.clone())
            .with_replication(config.replication())
            .with_page_size(config.page_size))
    }

    /// Replication policy used when creating secrets
    pub fn with_replication(mut self, replication: Replication) -> Self {
        self.replication = replication;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn client(&self) -> &Arc<dyn SecretClient> {
        &self.client
    }

    fn path(&self, operation: SecretOperation) -> PathBuilder {
        PathBuilder::new()
            .operation(operation)
            .project(self.project_id.as_str())
    }

    fn project_name(&self, operation: SecretOperation) -> Result<String> {
        Ok(self.path(operation).build_resource_name()?)
    }

    fn secret_name(&self, operation: SecretOperation, secret: &str) -> Result<String> {
        Ok(self.path(operation).secret(secret).build_resource_name()?)
    }

    fn version_name(&self, operation: SecretOperation, secret: &str, version: &str) -> Result<String> {
        Ok(self
            .path(operation)
            .secret(secret)
            .version(version)
            .build_resource_name()?)
    }

    /// Create request for `secret_name`, refused when the secret already exists
    async fn prepare_create(&self, secret_name: &str) -> Result<CreateSecretRequest> {
        let parent = self.project_name(SecretOperation::CreateSecret)?;
        // Validate before probing so a bad id is not mistaken for a missing secret
        self.secret_name(SecretOperation::GetSecret, secret_name)?;

        if self.secret_exists(secret_name).await {
            error!("failed to create secret as secret already exists");
            return Err(SecretManagerError::AlreadyExists {
                secret: secret_name.to_string(),
            });
        }

        Ok(CreateSecretRequest::new(
            parent,
            secret_name.to_string(),
            self.replication.clone(),
        ))
    }

    /// Create a secret with no versions
    pub async fn create_empty_secret(&self, secret_name: &str) -> Result<Secret> {
        let request = self.prepare_create(secret_name).await?;
        self.client.create_secret(&request).await.map_err(|e| {
            error!("failed to create secret: {}", e);
            e
        })
    }

    /// Create a secret and store `payload` as its first version
    pub async fn create_secret_with_data(
        &self,
        secret_name: &str,
        payload: &[u8],
    ) -> Result<SecretVersion> {
        let request = self.prepare_create(secret_name).await?;
        let secret = self.client.create_secret(&request).await.map_err(|e| {
            error!("failed to create secret: {}", e);
            e
        })?;

        let request = AddSecretVersionRequest {
            parent: secret.name,
            payload: SecretPayload::new(payload),
        };
        self.client.add_secret_version(&request).await.map_err(|e| {
            error!("failed to add secret version: {}", e);
            e
        })
    }

    /// Whether `secret_name` can be read; any failure counts as absent
    pub async fn secret_exists(&self, secret_name: &str) -> bool {
        let name = match self.secret_name(SecretOperation::GetSecret, secret_name) {
            Ok(name) => name,
            Err(e) => {
                debug!("secret {} treated as absent: {}", secret_name, e);
                return false;
            }
        };
        match self.client.get_secret(&GetSecretRequest { name }).await {
            Ok(_) => true,
            Err(e) => {
                debug!("secret {} treated as absent: {}", secret_name, e);
                false
            }
        }
    }

    /// Store `payload` as a new version of an existing secret
    pub async fn add_new_secret_version(
        &self,
        secret_name: &str,
        payload: &[u8],
    ) -> Result<SecretVersion> {
        let request = AddSecretVersionRequest {
            parent: self.secret_name(SecretOperation::AddVersion, secret_name)?,
            payload: SecretPayload::new(payload),
        };
        self.client.add_secret_version(&request).await.map_err(|e| {
            error!("failed to add secret version: {}", e);
            e
        })
    }

    /// Payload of `version`; an empty version reads `latest`
    pub async fn get_secret(&self, secret_name: &str, version: &str) -> Result<SecretPayload> {
        let request = AccessSecretVersionRequest {
            name: self.version_name(SecretOperation::AccessVersion, secret_name, version)?,
        };
        match self.client.access_secret_version(&request).await {
            Ok(response) => Ok(response.payload),
            Err(e) => {
                error!("failed to get secret: {}", e);
                Err(e)
            }
        }
    }

    /// Delete the secret together with all of its versions
    pub async fn delete_secret_and_versions(&self, secret_name: &str) -> Result<()> {
        let request = DeleteSecretRequest {
            name: self.secret_name(SecretOperation::DeleteSecret, secret_name)?,
            etag: String::new(),
        };
        match self.client.delete_secret(&request).await {
            Ok(()) => {
                info!("Secret {} deleted successfully", secret_name);
                Ok(())
            }
            Err(e) => {
                error!("failed to delete secret: {}", e);
                Err(e)
            }
        }
    }

    /// Irreversibly destroy the payload of one version
    pub async fn delete_secret_version(
        &self,
        secret_name: &str,
        version: &str,
    ) -> Result<SecretVersion> {
        let request = DestroySecretVersionRequest {
            name: self.version_name(SecretOperation::DestroyVersion, secret_name, version)?,
            etag: String::new(),
        };
        self.client.destroy_secret_version(&request).await.map_err(|e| {
            error!("failed to destroy secret version: {}", e);
            e
        })
    }

    pub async fn get_secret_metadata(
        &self,
        secret_name: &str,
        version: &str,
    ) -> Result<SecretVersion> {
        let request = GetSecretVersionRequest {
            name: self.version_name(SecretOperation::GetVersion, secret_name, version)?,
        };
        self.client.get_secret_version(&request).await.map_err(|e| {
            error!("failed to get secret version metadata: {}", e);
            e
        })
    }

    pub async fn disable_secret(&self, secret_name: &str, version: &str) -> Result<SecretVersion> {
        let request = DisableSecretVersionRequest {
            name: self.version_name(SecretOperation::DisableVersion, secret_name, version)?,
            etag: String::new(),
        };
        self.client.disable_secret_version(&request).await.map_err(|e| {
            error!("failed to disable secret version: {}", e);
            e
        })
    }

    pub async fn enable_secret(&self, secret_name: &str, version: &str) -> Result<SecretVersion> {
        let request = EnableSecretVersionRequest {
            name: self.version_name(SecretOperation::EnableVersion, secret_name, version)?,
            etag: String::new(),
        };
        self.client.enable_secret_version(&request).await.map_err(|e| {
            error!("failed to enable secret version: {}", e);
            e
        })
    }

    /// Every secret in the project, across all pages
    pub async fn list_secrets(&self) -> Result<Vec<Secret>> {
        let mut request = ListSecretsRequest {
            parent: self.project_name(SecretOperation::ListSecrets)?,
            page_size: self.page_size,
            ..Default::default()
        };
        let mut secrets = Vec::new();
        loop {
            let page = self.client.list_secrets(&request).await.map_err(|e| {
                error!("failed to list secrets: {}", e);
                e
            })?;
            secrets.extend(page.secrets);
            if page.next_page_token.is_empty() {
                return Ok(secrets);
            }
            request.page_token = page.next_page_token;
        }
    }

    /// Every version of `secret_name`, newest first, across all pages
    pub async fn list_secret_versions(&self, secret_name: &str) -> Result<Vec<SecretVersion>> {
        let mut request = ListSecretVersionsRequest {
            parent: self.secret_name(SecretOperation::ListVersions, secret_name)?,
            page_size: self.page_size,
            ..Default::default()
        };
        let mut versions = Vec::new();
        loop {
            let page = self.client.list_secret_versions(&request).await.map_err(|e| {
                error!("failed to list secret versions: {}", e);
                e
            })?;
            versions.extend(page.versions);
            if page.next_page_token.is_empty() {
                return Ok(versions);
            }
            request.page_token = page.next_page_token;
        }
    }

    /// Release the underlying client
    pub async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}
