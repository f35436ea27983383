//! In-memory Secret Manager double
//!
//! Mirrors the service's observable behavior closely enough to exercise the
//! helper layer without a network:
//! - version ids are sequential per secret, starting at 1
//! - `latest` resolves to the highest enabled version
//! - accessing a disabled or destroyed version fails with `FAILED_PRECONDITION`
//! - unknown names fail with `NOT_FOUND`, duplicates with `ALREADY_EXISTS`
//!
//! Every request is recorded and can be inspected with [`MockSecretClient::calls`].
//! [`MockSecretClient::fail_on`] queues an error for the next call of a method.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::{ClientFactory, SecretClient};
use crate::constants::LATEST_VERSION;
use crate::error::{ApiError, Result};
use crate::model::{
    AccessSecretVersionRequest, AccessSecretVersionResponse, AddSecretVersionRequest,
    CreateSecretRequest, DeleteSecretRequest, DestroySecretVersionRequest,
    DisableSecretVersionRequest, EnableSecretVersionRequest, GetSecretRequest,
    GetSecretVersionRequest, ListSecretVersionsRequest, ListSecretVersionsResponse,
    ListSecretsRequest, ListSecretsResponse, Secret, SecretPayload, SecretVersion, VersionState,
};
use crate::paths::{validate_secret_id, ResourceName, ResourceScope};

/// [`SecretClient`] methods, used to target injected failures and filter calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretMethod {
    AccessSecretVersion,
    ListSecretVersions,
    DestroySecretVersion,
    CreateSecret,
    AddSecretVersion,
    DeleteSecret,
    GetSecret,
    ListSecrets,
    GetSecretVersion,
    DisableSecretVersion,
    EnableSecretVersion,
    Close,
}

/// A request received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    AccessSecretVersion(AccessSecretVersionRequest),
    ListSecretVersions(ListSecretVersionsRequest),
    DestroySecretVersion(DestroySecretVersionRequest),
    CreateSecret(CreateSecretRequest),
    AddSecretVersion(AddSecretVersionRequest),
    DeleteSecret(DeleteSecretRequest),
    GetSecret(GetSecretRequest),
    ListSecrets(ListSecretsRequest),
    GetSecretVersion(GetSecretVersionRequest),
    DisableSecretVersion(DisableSecretVersionRequest),
    EnableSecretVersion(EnableSecretVersionRequest),
    Close,
}

impl RecordedCall {
    pub fn method(&self) -> SecretMethod {
        match self {
            Self::AccessSecretVersion(_) => SecretMethod::AccessSecretVersion,
            Self::ListSecretVersions(_) => SecretMethod::ListSecretVersions,
            Self::DestroySecretVersion(_) => SecretMethod::DestroySecretVersion,
            Self::CreateSecret(_) => SecretMethod::CreateSecret,
            Self::AddSecretVersion(_) => SecretMethod::AddSecretVersion,
            Self::DeleteSecret(_) => SecretMethod::DeleteSecret,
            Self::GetSecret(_) => SecretMethod::GetSecret,
            Self::ListSecrets(_) => SecretMethod::ListSecrets,
            Self::GetSecretVersion(_) => SecretMethod::GetSecretVersion,
            Self::DisableSecretVersion(_) => SecretMethod::DisableSecretVersion,
            Self::EnableSecretVersion(_) => SecretMethod::EnableSecretVersion,
            Self::Close => SecretMethod::Close,
        }
    }
}

#[derive(Debug)]
struct StoredVersion {
    version: SecretVersion,
    payload: SecretPayload,
}

#[derive(Debug)]
struct StoredSecret {
    secret: Secret,
    versions: Vec<StoredVersion>,
}

impl StoredSecret {
    fn resolve(&self, name: &str, version: &str) -> Result<usize> {
        if version == LATEST_VERSION {
            return self
                .versions
                .iter()
                .rposition(|v| v.version.state == VersionState::Enabled)
                .ok_or_else(|| {
                    ApiError::not_found(format!("Secret [{name}] has no enabled versions.")).into()
                });
        }
        version
            .parse::<usize>()
            .ok()
            .filter(|id| (1..=self.versions.len()).contains(id))
            .map(|id| id - 1)
            .ok_or_else(|| ApiError::not_found(format!("Secret Version [{name}] not found.")).into())
    }
}

#[derive(Debug, Default)]
struct MockState {
    secrets: BTreeMap<String, StoredSecret>,
    calls: Vec<RecordedCall>,
    failures: HashMap<SecretMethod, VecDeque<ApiError>>,
}

impl MockState {
    fn secret(&self, name: &str) -> Result<&StoredSecret> {
        self.secrets
            .get(name)
            .ok_or_else(|| ApiError::not_found(format!("Secret [{name}] not found.")).into())
    }

    fn secret_mut(&mut self, name: &str) -> Result<&mut StoredSecret> {
        self.secrets
            .get_mut(name)
            .ok_or_else(|| ApiError::not_found(format!("Secret [{name}] not found.")).into())
    }

    /// Looks up a version by its full name, resolving `latest`
    fn version_mut(&mut self, name: &str) -> Result<&mut StoredVersion> {
        let (secret_name, version) = split_version_name(name)?;
        let stored = self.secret_mut(&secret_name)?;
        let index = stored.resolve(name, &version)?;
        Ok(&mut stored.versions[index])
    }
}

fn split_version_name(name: &str) -> Result<(String, String)> {
    let parsed = ResourceName::parse(name)?;
    match (parsed.secret_name(), parsed.version) {
        (Some(secret_name), Some(version)) => Ok((secret_name, version)),
        _ => Err(ApiError::invalid_argument(format!("Invalid secret version name [{name}].")).into()),
    }
}

fn check_etag(current: &str, requested: &str) -> Result<()> {
    if requested.is_empty() || requested == current {
        Ok(())
    } else {
        Err(ApiError::new(409, "ABORTED", "The etag provided in the request does not match.").into())
    }
}

fn new_etag() -> String {
    format!("\"{}\"", Uuid::new_v4().simple())
}

/// Offset-based paging; the page token is the index of the first item
fn page<T: Clone>(items: &[T], page_size: u32, page_token: &str) -> Result<(Vec<T>, String)> {
    let start = if page_token.is_empty() {
        0
    } else {
        page_token
            .parse::<usize>()
            .map_err(|e| ApiError::invalid_argument(format!("Invalid page token [{page_token}]: {e}.")))?
    };
    let start = start.min(items.len());
    let end = if page_size == 0 {
        items.len()
    } else {
        (start + page_size as usize).min(items.len())
    };
    let next = if end < items.len() {
        end.to_string()
    } else {
        String::new()
    };
    Ok((items[start..end].to_vec(), next))
}

/// In-memory [`SecretClient`]
#[derive(Debug, Default)]
pub struct MockSecretClient {
    state: Mutex<MockState>,
}

impl MockSecretClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    /// Requests received for one method
    pub async fn calls_for(&self, method: SecretMethod) -> Vec<RecordedCall> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.method() == method)
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Fail the next call of `method` with `error`
    ///
    /// Errors queue up; each call consumes one.
    pub async fn fail_on(&self, method: SecretMethod, error: ApiError) {
        self.state
            .lock()
            .await
            .failures
            .entry(method)
            .or_default()
            .push_back(error);
    }

    /// Number of secrets currently stored
    pub async fn secret_count(&self) -> usize {
        self.state.lock().await.secrets.len()
    }

    /// Record the call and surface an injected failure, if one is queued
    async fn begin(&self, call: RecordedCall) -> Result<MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().await;
        let method = call.method();
        debug!("mock secret client received {:?}", method);
        state.calls.push(call);
        if let Some(error) = state.failures.get_mut(&method).and_then(VecDeque::pop_front) {
            return Err(error.into());
        }
        Ok(state)
    }
}

#[async_trait]
impl SecretClient for MockSecretClient {
    async fn access_secret_version(
        &self,
        req: &AccessSecretVersionRequest,
    ) -> Result<AccessSecretVersionResponse> {
        let mut state = self
            .begin(RecordedCall::AccessSecretVersion(req.clone()))
            .await?;
        let stored = state.version_mut(&req.name)?;
        match stored.version.state {
            VersionState::Enabled => Ok(AccessSecretVersionResponse {
                name: stored.version.name.clone(),
                payload: SecretPayload::with_checksum(stored.payload.data()),
            }),
            other => Err(ApiError::failed_precondition(format!(
                "Secret Version [{}] is in {} state.",
                stored.version.name, other
            ))
            .into()),
        }
    }

    async fn list_secret_versions(
        &self,
        req: &ListSecretVersionsRequest,
    ) -> Result<ListSecretVersionsResponse> {
        let state = self
            .begin(RecordedCall::ListSecretVersions(req.clone()))
            .await?;
        let stored = state.secret(&req.parent)?;
        // Newest first, as the service lists them
        let versions: Vec<SecretVersion> = stored
            .versions
            .iter()
            .rev()
            .map(|v| v.version.clone())
            .collect();
        let total_size = versions.len() as i32;
        let (versions, next_page_token) = page(&versions, req.page_size, &req.page_token)?;
        Ok(ListSecretVersionsResponse {
            versions,
            next_page_token,
            total_size,
        })
    }

    async fn destroy_secret_version(
        &self,
        req: &DestroySecretVersionRequest,
    ) -> Result<SecretVersion> {
        let mut state = self
            .begin(RecordedCall::DestroySecretVersion(req.clone()))
            .await?;
        let stored = state.version_mut(&req.name)?;
        check_etag(&stored.version.etag, &req.etag)?;
        if stored.version.state == VersionState::Destroyed {
            return Err(ApiError::failed_precondition(format!(
                "Secret Version [{}] is already destroyed.",
                stored.version.name
            ))
            .into());
        }
        stored.version.state = VersionState::Destroyed;
        stored.version.destroy_time = Some(Utc::now());
        stored.version.etag = new_etag();
        stored.payload = SecretPayload::default();
        Ok(stored.version.clone())
    }

    async fn create_secret(&self, req: &CreateSecretRequest) -> Result<Secret> {
        let mut state = self.begin(RecordedCall::CreateSecret(req.clone())).await?;
        let parent = ResourceName::parse(&req.parent)?;
        if parent.scope() != ResourceScope::Project {
            return Err(ApiError::invalid_argument(format!(
                "Invalid parent [{}].",
                req.parent
            ))
            .into());
        }
        validate_secret_id(&req.secret_id)?;

        let name = format!("{}/secrets/{}", req.parent, req.secret_id);
        if state.secrets.contains_key(&name) {
            return Err(ApiError::already_exists(format!("Secret [{name}] already exists.")).into());
        }

        let secret = Secret {
            name: name.clone(),
            create_time: Some(Utc::now()),
            etag: new_etag(),
            ..req.secret.clone()
        };
        state.secrets.insert(
            name,
            StoredSecret {
                secret: secret.clone(),
                versions: Vec::new(),
            },
        );
        Ok(secret)
    }

    async fn add_secret_version(&self, req: &AddSecretVersionRequest) -> Result<SecretVersion> {
        let mut state = self
            .begin(RecordedCall::AddSecretVersion(req.clone()))
            .await?;
        if let Err((expected, actual)) = req.payload.verify_checksum() {
            return Err(ApiError::invalid_argument(format!(
                "Checksum mismatch: expected {expected}, computed {actual}."
            ))
            .into());
        }
        let stored = state.secret_mut(&req.parent)?;
        let version = SecretVersion {
            name: format!("{}/versions/{}", req.parent, stored.versions.len() + 1),
            create_time: Some(Utc::now()),
            destroy_time: None,
            state: VersionState::Enabled,
            etag: new_etag(),
            client_specified_payload_checksum: req.payload.data_crc32c.is_some(),
        };
        stored.versions.push(StoredVersion {
            version: version.clone(),
            payload: SecretPayload::new(req.payload.data()),
        });
        Ok(version)
    }

    async fn delete_secret(&self, req: &DeleteSecretRequest) -> Result<()> {
        let mut state = self.begin(RecordedCall::DeleteSecret(req.clone())).await?;
        let stored = state.secret(&req.name)?;
        check_etag(&stored.secret.etag, &req.etag)?;
        state.secrets.remove(&req.name);
        Ok(())
    }

    async fn get_secret(&self, req: &GetSecretRequest) -> Result<Secret> {
        let state = self.begin(RecordedCall::GetSecret(req.clone())).await?;
        Ok(state.secret(&req.name)?.secret.clone())
    }

    async fn list_secrets(&self, req: &ListSecretsRequest) -> Result<ListSecretsResponse> {
        let state = self.begin(RecordedCall::ListSecrets(req.clone())).await?;
        let prefix = format!("{}/secrets/", req.parent);
        // Only `name:<substring>` filters are understood
        let name_filter = req.filter.strip_prefix("name:").map(str::trim);
        let secrets: Vec<Secret> = state
            .secrets
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .filter(|(name, _)| name_filter.is_none_or(|f| name.contains(f)))
            .map(|(_, stored)| stored.secret.clone())
            .collect();
        let total_size = secrets.len() as i32;
        let (secrets, next_page_token) = page(&secrets, req.page_size, &req.page_token)?;
        Ok(ListSecretsResponse {
            secrets,
            next_page_token,
            total_size,
        })
    }

    async fn get_secret_version(&self, req: &GetSecretVersionRequest) -> Result<SecretVersion> {
        let mut state = self
            .begin(RecordedCall::GetSecretVersion(req.clone()))
            .await?;
        Ok(state.version_mut(&req.name)?.version.clone())
    }

    async fn disable_secret_version(
        &self,
        req: &DisableSecretVersionRequest,
    ) -> Result<SecretVersion> {
        let mut state = self
            .begin(RecordedCall::DisableSecretVersion(req.clone()))
            .await?;
        let stored = state.version_mut(&req.name)?;
        set_state(stored, &req.etag, VersionState::Disabled)
    }

    async fn enable_secret_version(
        &self,
        req: &EnableSecretVersionRequest,
    ) -> Result<SecretVersion> {
        let mut state = self
            .begin(RecordedCall::EnableSecretVersion(req.clone()))
            .await?;
        let stored = state.version_mut(&req.name)?;
        set_state(stored, &req.etag, VersionState::Enabled)
    }

    async fn close(&self) -> Result<()> {
        drop(self.begin(RecordedCall::Close).await?);
        Ok(())
    }
}

fn set_state(stored: &mut StoredVersion, etag: &str, target: VersionState) -> Result<SecretVersion> {
    check_etag(&stored.version.etag, etag)?;
    if stored.version.state == VersionState::Destroyed {
        return Err(ApiError::failed_precondition(format!(
            "Secret Version [{}] is destroyed.",
            stored.version.name
        ))
        .into());
    }
    stored.version.state = target;
    stored.version.etag = new_etag();
    Ok(stored.version.clone())
}

/// Hands out one shared [`MockSecretClient`]
#[derive(Debug, Clone, Default)]
pub struct MockClientFactory {
    client: Arc<MockSecretClient>,
}

impl MockClientFactory {
    pub fn new(client: Arc<MockSecretClient>) -> Self {
        Self { client }
    }

    /// The client every `new_secret_client` call returns
    pub fn client(&self) -> Arc<MockSecretClient> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn new_secret_client(&self) -> Result<Arc<dyn SecretClient>> {
        let client = Arc::clone(&self.client);
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecretManagerError;
    use crate::model::Replication;

    const PARENT: &str = "projects/test-project";
    const SECRET: &str = "projects/test-project/secrets/db";

    async fn seeded(versions: &[&str]) -> MockSecretClient {
        let client = MockSecretClient::new();
        client
            .create_secret(&CreateSecretRequest::new(
                PARENT.to_string(),
                "db".to_string(),
                Replication::automatic(),
            ))
            .await
            .unwrap();
        for data in versions {
            client
                .add_secret_version(&AddSecretVersionRequest {
                    parent: SECRET.to_string(),
                    payload: SecretPayload::new(*data),
                })
                .await
                .unwrap();
        }
        client
    }

    fn access(version: &str) -> AccessSecretVersionRequest {
        AccessSecretVersionRequest {
            name: format!("{SECRET}/versions/{version}"),
        }
    }

    #[tokio::test]
    async fn test_versions_are_sequential_and_latest_skips_disabled() {
        let client = seeded(&["one", "two", "three"]).await;

        let latest = client.access_secret_version(&access("latest")).await.unwrap();
        assert_eq!(latest.name, format!("{SECRET}/versions/3"));
        assert_eq!(latest.payload.as_str(), Some("three"));

        client
            .disable_secret_version(&DisableSecretVersionRequest {
                name: format!("{SECRET}/versions/3"),
                etag: String::new(),
            })
            .await
            .unwrap();

        let latest = client.access_secret_version(&access("latest")).await.unwrap();
        assert_eq!(latest.payload.as_str(), Some("two"));

        let err = client.access_secret_version(&access("3")).await.unwrap_err();
        assert_eq!(err.api_error().unwrap().status, "FAILED_PRECONDITION");
    }

    #[tokio::test]
    async fn test_destroyed_version_cannot_be_enabled() {
        let client = seeded(&["one"]).await;
        let destroyed = client
            .destroy_secret_version(&DestroySecretVersionRequest {
                name: format!("{SECRET}/versions/1"),
                etag: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(destroyed.state, VersionState::Destroyed);
        assert!(destroyed.destroy_time.is_some());

        let err = client
            .enable_secret_version(&EnableSecretVersionRequest {
                name: format!("{SECRET}/versions/1"),
                etag: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.api_error().unwrap().status, "FAILED_PRECONDITION");

        let err = client.access_secret_version(&access("latest")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_and_unknown_secrets() {
        let client = seeded(&[]).await;
        let err = client
            .create_secret(&CreateSecretRequest::new(
                PARENT.to_string(),
                "db".to_string(),
                Replication::automatic(),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.api_error().unwrap().status, "ALREADY_EXISTS");

        let err = client
            .get_secret(&GetSecretRequest {
                name: format!("{PARENT}/secrets/missing"),
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stale_etag_is_rejected() {
        let client = seeded(&["one"]).await;
        let err = client
            .disable_secret_version(&DisableSecretVersionRequest {
                name: format!("{SECRET}/versions/1"),
                etag: "\"stale\"".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.api_error().unwrap().status, "ABORTED");
    }

    #[tokio::test]
    async fn test_fail_on_is_consumed_once() {
        let client = seeded(&["one"]).await;
        let injected = ApiError::new(503, "UNAVAILABLE", "try again");
        client
            .fail_on(SecretMethod::AccessSecretVersion, injected.clone())
            .await;

        let err = client.access_secret_version(&access("1")).await.unwrap_err();
        assert_eq!(err.api_error(), Some(&injected));
        assert!(client.access_secret_version(&access("1")).await.is_ok());
        assert_eq!(
            client.calls_for(SecretMethod::AccessSecretVersion).await.len(),
            2
        );
    }

    #[tokio::test]
    async fn test_list_versions_pages_newest_first() {
        let client = seeded(&["one", "two", "three"]).await;
        let first = client
            .list_secret_versions(&ListSecretVersionsRequest {
                parent: SECRET.to_string(),
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(first.versions.len(), 2);
        assert_eq!(first.versions[0].version_id(), "3");
        assert_eq!(first.next_page_token, "2");

        let second = client
            .list_secret_versions(&ListSecretVersionsRequest {
                parent: SECRET.to_string(),
                page_size: 2,
                page_token: first.next_page_token,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(second.versions.len(), 1);
        assert_eq!(second.versions[0].version_id(), "1");
        assert!(second.next_page_token.is_empty());
    }

    #[tokio::test]
    async fn test_factory_shares_one_client() {
        let factory = MockClientFactory::default();
        let client = factory.new_secret_client().await.unwrap();
        client.close().await.unwrap();
        assert_eq!(factory.client().calls().await, vec![RecordedCall::Close]);
    }

    #[tokio::test]
    async fn test_close_surfaces_injected_failure() {
        let client = seeded(&["one"]).await;
        let injected = ApiError::new(503, "UNAVAILABLE", "shutting down");
        client.fail_on(SecretMethod::Close, injected.clone()).await;

        match client.close().await {
            Err(SecretManagerError::Api(e)) => assert_eq!(e, injected),
            other => panic!("expected injected error, got {other:?}"),
        }
        client.close().await.unwrap();
        // The store stays usable after close
        assert_eq!(client.secret_count().await, 1);
        assert_eq!(client.calls_for(SecretMethod::Close).await.len(), 2);
    }
}
