//! # Request and Response Messages
//!
//! One request type per remote call, carrying the same fields as the
//! Secret Manager v1 API. `name`/`parent` fields hold full resource names
//! (see [`crate::paths::PathBuilder`]).

use serde::{Deserialize, Serialize};

use super::resources::{Replication, Secret, SecretPayload, SecretVersion};

/// `POST /v1/{parent}/secrets?secretId={secret_id}` with `secret` as the body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSecretRequest {
    /// `projects/*`
    pub parent: String,
    pub secret_id: String,
    pub secret: Secret,
}

impl CreateSecretRequest {
    pub fn new(parent: String, secret_id: String, replication: Replication) -> Self {
        Self {
            parent,
            secret_id,
            secret: Secret::with_replication(replication),
        }
    }
}

/// `POST /v1/{parent}:addVersion`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddSecretVersionRequest {
    /// `projects/*/secrets/*`
    pub parent: String,
    pub payload: SecretPayload,
}

/// `GET /v1/{name}:access`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSecretVersionRequest {
    /// `projects/*/secrets/*/versions/*`; `latest` is accepted as a version
    pub name: String,
}

/// `GET /v1/{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetSecretRequest {
    pub name: String,
}

/// `DELETE /v1/{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSecretRequest {
    pub name: String,
    /// Optional etag; the call fails with `ABORTED` if it is stale
    pub etag: String,
}

/// `GET /v1/{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetSecretVersionRequest {
    pub name: String,
}

/// `POST /v1/{name}:destroy`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestroySecretVersionRequest {
    pub name: String,
    pub etag: String,
}

/// `POST /v1/{name}:disable`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisableSecretVersionRequest {
    pub name: String,
    pub etag: String,
}

/// `POST /v1/{name}:enable`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnableSecretVersionRequest {
    pub name: String,
    pub etag: String,
}

/// `GET /v1/{parent}/secrets`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSecretsRequest {
    /// `projects/*`
    pub parent: String,
    /// 0 lets the server pick
    pub page_size: u32,
    pub page_token: String,
    pub filter: String,
}

/// `GET /v1/{parent}/versions`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSecretVersionsRequest {
    /// `projects/*/secrets/*`
    pub parent: String,
    pub page_size: u32,
    pub page_token: String,
    pub filter: String,
}

/// Response from accessing a secret version
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets.versions/access
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSecretVersionResponse {
    /// Resolved version name (`latest` is replaced with the concrete id)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub payload: SecretPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSecretsResponse {
    #[serde(default)]
    pub secrets: Vec<Secret>,
    /// Empty on the last page
    #[serde(default)]
    pub next_page_token: String,
    #[serde(default)]
    pub total_size: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSecretVersionsResponse {
    #[serde(default)]
    pub versions: Vec<SecretVersion>,
    #[serde(default)]
    pub next_page_token: String,
    #[serde(default)]
    pub total_size: i32,
}

/// Body of `:addVersion`
#[derive(Debug, Serialize)]
pub(crate) struct AddVersionBody<'a> {
    pub payload: &'a SecretPayload,
}

/// Body of `:destroy`, `:disable` and `:enable`
#[derive(Debug, Serialize)]
pub(crate) struct EtagBody<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    pub etag: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_defaults_when_empty() {
        let parsed: ListSecretsResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.secrets.is_empty());
        assert!(parsed.next_page_token.is_empty());
    }

    #[test]
    fn test_etag_body_omits_empty_etag() {
        assert_eq!(serde_json::to_value(EtagBody { etag: "" }).unwrap(), json!({}));
        assert_eq!(
            serde_json::to_value(EtagBody { etag: "\"abc\"" }).unwrap(),
            json!({ "etag": "\"abc\"" })
        );
    }
}
