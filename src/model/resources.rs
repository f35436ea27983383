//! # Resource Types
//!
//! Secret, secret version and payload resources as returned by the REST API.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::LATEST_VERSION;

/// Secret resource representation
///
/// A named container for versioned confidential data. Used both as the body of
/// a create call and as the response of create/get/list.
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets#Secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// The resource name of the secret in the format `projects/*/secrets/*`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Replication policy; immutable once the secret is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication: Option<Replication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<DateTime<Utc>>,
}

impl Secret {
    /// A secret body carrying only a replication policy
    pub fn with_replication(replication: Replication) -> Self {
        Self {
            replication: Some(replication),
            ..Self::default()
        }
    }

    /// Short secret id (last segment of the resource name)
    pub fn secret_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// Replication configuration for a secret
///
/// Exactly one of `automatic` or `user_managed` is set.
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/Replication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replication {
    /// The secret is replicated to all regions without restriction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic: Option<AutomaticReplication>,
    /// The secret is replicated only to the listed locations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_managed: Option<UserManagedReplication>,
}

impl Replication {
    pub fn automatic() -> Self {
        Self {
            automatic: Some(AutomaticReplication {}),
            user_managed: None,
        }
    }

    pub fn user_managed<I, S>(locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            automatic: None,
            user_managed: Some(UserManagedReplication {
                replicas: locations
                    .into_iter()
                    .map(|location| Replica {
                        location: location.into(),
                    })
                    .collect(),
            }),
        }
    }
}

/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/Replication#Automatic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticReplication {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserManagedReplication {
    pub replicas: Vec<Replica>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    /// Canonical location id, e.g. `us-east1`
    pub location: String,
}

/// Lifecycle state of a secret version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionState {
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "ENABLED")]
    Enabled,
    #[serde(rename = "DISABLED")]
    Disabled,
    /// Payload is irrevocably gone; only metadata remains
    #[serde(rename = "DESTROYED")]
    Destroyed,
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unspecified => "STATE_UNSPECIFIED",
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Destroyed => "DESTROYED",
        })
    }
}

/// Secret version metadata (never carries the payload)
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets.versions#SecretVersion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVersion {
    /// `projects/*/secrets/*/versions/*`; version ids are sequential integers
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destroy_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: VersionState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
    /// True if the payload was sent with a `dataCrc32c` checksum
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub client_specified_payload_checksum: bool,
}

impl SecretVersion {
    /// Version id (last segment of the resource name)
    pub fn version_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(LATEST_VERSION)
    }
}

/// Secret payload containing the actual secret data
///
/// `data` travels base64-encoded over REST; in memory it is raw bytes and is
/// wiped when the payload is dropped.
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/SecretPayload
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SecretPayload {
    #[serde(default, with = "super::base64_bytes")]
    pub data: Vec<u8>,
    /// CRC32C of `data`; optional on write, verified on read when present
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::int64_string"
    )]
    pub data_crc32c: Option<i64>,
}

impl SecretPayload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            data_crc32c: None,
        }
    }

    /// Payload with its CRC32C checksum filled in
    pub fn with_checksum(data: impl Into<Vec<u8>>) -> Self {
        let mut payload = Self::new(data);
        payload.data_crc32c = Some(payload.checksum());
        payload
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload as UTF-8, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// CRC32C of the payload bytes, as the API represents it
    pub fn checksum(&self) -> i64 {
        i64::from(crc32c::crc32c(&self.data))
    }

    /// `Err((expected, actual))` when a checksum is present and does not match
    pub fn verify_checksum(&self) -> Result<(), (i64, i64)> {
        match self.data_crc32c {
            Some(expected) if expected != self.checksum() => Err((expected, self.checksum())),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("data", &format_args!("<redacted {} bytes>", self.data.len()))
            .field("data_crc32c", &self.data_crc32c)
            .finish()
    }
}
