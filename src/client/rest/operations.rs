//! [`SecretClient`] implementation for the REST client
//!
//! Each call builds its path from the request's resource name via
//! [`SecretOperation::http_path`] and sends exactly one HTTP request.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::SecretManagerREST;
use crate::client::SecretClient;
use crate::error::{Result, SecretManagerError};
use crate::model::requests::{AddVersionBody, EtagBody};
use crate::model::{
    AccessSecretVersionRequest, AccessSecretVersionResponse, AddSecretVersionRequest,
    CreateSecretRequest, DeleteSecretRequest, DestroySecretVersionRequest,
    DisableSecretVersionRequest, EnableSecretVersionRequest, GetSecretRequest,
    GetSecretVersionRequest, ListSecretVersionsRequest, ListSecretVersionsResponse,
    ListSecretsRequest, ListSecretsResponse, Secret, SecretPayload, SecretVersion,
};
use crate::paths::{validate_secret_id, SecretOperation};

/// `google.protobuf.Empty`
#[derive(Debug, Deserialize)]
struct Empty {}

/// Query parameters shared by the list calls; defaults are not sent
fn list_query(page_size: u32, page_token: &str, filter: &str) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if page_size > 0 {
        query.push(("pageSize", page_size.to_string()));
    }
    if !page_token.is_empty() {
        query.push(("pageToken", page_token.to_string()));
    }
    if !filter.is_empty() {
        query.push(("filter", filter.to_string()));
    }
    query
}

impl SecretManagerREST {
    /// `:destroy`, `:disable` and `:enable` share a body and response
    async fn change_version_state(
        &self,
        operation: SecretOperation,
        name: &str,
        etag: &str,
    ) -> Result<SecretVersion> {
        let path = operation.http_path(name)?;
        let request = self
            .make_request(operation.method(), &path)
            .json(&EtagBody { etag });
        self.execute(operation, name, request).await
    }
}

#[async_trait]
impl SecretClient for SecretManagerREST {
    async fn access_secret_version(
        &self,
        req: &AccessSecretVersionRequest,
    ) -> Result<AccessSecretVersionResponse> {
        let operation = SecretOperation::AccessVersion;
        let path = operation.http_path(&req.name)?;
        let request = self.make_request(operation.method(), &path);
        let response: AccessSecretVersionResponse =
            self.execute(operation, &req.name, request).await?;

        if let Err((expected, actual)) = response.payload.verify_checksum() {
            warn!(
                "Payload checksum mismatch for {}: expected {}, computed {}",
                response.name, expected, actual
            );
            return Err(SecretManagerError::Checksum {
                name: response.name.clone(),
                expected,
                actual,
            });
        }
        Ok(response)
    }

    async fn list_secret_versions(
        &self,
        req: &ListSecretVersionsRequest,
    ) -> Result<ListSecretVersionsResponse> {
        let operation = SecretOperation::ListVersions;
        let path = operation.http_path(&req.parent)?;
        let request = self
            .make_request(operation.method(), &path)
            .query(&list_query(req.page_size, &req.page_token, &req.filter));
        self.execute(operation, &req.parent, request).await
    }

    async fn destroy_secret_version(
        &self,
        req: &DestroySecretVersionRequest,
    ) -> Result<SecretVersion> {
        self.change_version_state(SecretOperation::DestroyVersion, &req.name, &req.etag)
            .await
    }

    async fn create_secret(&self, req: &CreateSecretRequest) -> Result<Secret> {
        validate_secret_id(&req.secret_id)?;
        let operation = SecretOperation::CreateSecret;
        let path = operation.http_path(&req.parent)?;
        let request = self
            .make_request(operation.method(), &path)
            .query(&[("secretId", req.secret_id.as_str())])
            .json(&req.secret);
        let resource = format!("{}/secrets/{}", req.parent, req.secret_id);
        self.execute(operation, &resource, request).await
    }

    async fn add_secret_version(&self, req: &AddSecretVersionRequest) -> Result<SecretVersion> {
        let operation = SecretOperation::AddVersion;
        let path = operation.http_path(&req.parent)?;

        let with_checksum;
        let payload = if req.payload.data_crc32c.is_some() {
            &req.payload
        } else {
            with_checksum = SecretPayload::with_checksum(req.payload.data());
            &with_checksum
        };

        let request = self
            .make_request(operation.method(), &path)
            .json(&AddVersionBody { payload });
        self.execute(operation, &req.parent, request).await
    }

    async fn delete_secret(&self, req: &DeleteSecretRequest) -> Result<()> {
        let operation = SecretOperation::DeleteSecret;
        let path = operation.http_path(&req.name)?;
        let mut request = self.make_request(operation.method(), &path);
        if !req.etag.is_empty() {
            request = request.query(&[("etag", req.etag.as_str())]);
        }
        let _: Empty = self.execute(operation, &req.name, request).await?;
        Ok(())
    }

    async fn get_secret(&self, req: &GetSecretRequest) -> Result<Secret> {
        let operation = SecretOperation::GetSecret;
        let path = operation.http_path(&req.name)?;
        let request = self.make_request(operation.method(), &path);
        self.execute(operation, &req.name, request).await
    }

    async fn list_secrets(&self, req: &ListSecretsRequest) -> Result<ListSecretsResponse> {
        let operation = SecretOperation::ListSecrets;
        let path = operation.http_path(&req.parent)?;
        let request = self
            .make_request(operation.method(), &path)
            .query(&list_query(req.page_size, &req.page_token, &req.filter));
        self.execute(operation, &req.parent, request).await
    }

    async fn get_secret_version(&self, req: &GetSecretVersionRequest) -> Result<SecretVersion> {
        let operation = SecretOperation::GetVersion;
        let path = operation.http_path(&req.name)?;
        let request = self.make_request(operation.method(), &path);
        self.execute(operation, &req.name, request).await
    }

    async fn disable_secret_version(
        &self,
        req: &DisableSecretVersionRequest,
    ) -> Result<SecretVersion> {
        self.change_version_state(SecretOperation::DisableVersion, &req.name, &req.etag)
            .await
    }

    async fn enable_secret_version(
        &self,
        req: &EnableSecretVersionRequest,
    ) -> Result<SecretVersion> {
        self.change_version_state(SecretOperation::EnableVersion, &req.name, &req.etag)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_skips_defaults() {
        assert!(list_query(0, "", "").is_empty());
        assert_eq!(
            list_query(10, "tok", "labels.env=prod"),
            vec![
                ("pageSize", "10".to_string()),
                ("pageToken", "tok".to_string()),
                ("filter", "labels.env=prod".to_string()),
            ]
        );
    }
}
