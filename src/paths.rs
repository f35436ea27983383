//! # Resource Paths
//!
//! Type-safe construction of Secret Manager resource names and REST paths.
//!
//! Every remote call is named by a [`SecretOperation`]. The operation knows
//! which resource it addresses (project, secret or version), its HTTP method
//! and its REST action suffix, so the helper layer and the REST client agree
//! on the wire shape from a single place.
//!
//! ```rust
//! use secret_manager_client::paths::{PathBuilder, SecretOperation};
//!
//! let name = PathBuilder::new()
//!     .operation(SecretOperation::AccessVersion)
//!     .project("my-project")
//!     .secret("db-password")
//!     .version("latest")
//!     .build_resource_name()
//!     .unwrap();
//! assert_eq!(name, "projects/my-project/secrets/db-password/versions/latest");
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;

use crate::constants::{API_VERSION, LATEST_VERSION};

static PROJECT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z][a-z0-9-]{4,28}[a-z0-9]|[0-9]{1,20})$")
        .unwrap_or_else(|e| panic!("invalid project id regex: {e}"))
});

static SECRET_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,255}$")
        .unwrap_or_else(|e| panic!("invalid secret id regex: {e}"))
});

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(latest|[1-9][0-9]*)$").unwrap_or_else(|e| panic!("invalid version regex: {e}"))
});

/// Errors that can occur during path construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathBuilderError {
    #[error("Operation not set")]
    MissingOperation,

    #[error("Missing required parameter: {0}")]
    MissingRequiredParameter(&'static str),

    #[error("Invalid project id '{0}'")]
    InvalidProject(String),

    /// Secret ids: alphanumeric, hyphens, underscores, 1-255 characters
    #[error("Invalid secret id '{0}': must contain only alphanumeric characters, hyphens, and underscores (1-255 characters)")]
    InvalidSecret(String),

    #[error("Invalid version '{0}': must be 'latest' or a positive integer")]
    InvalidVersion(String),

    #[error("Malformed resource name '{0}'")]
    MalformedName(String),

    #[error("{operation:?} expects a {expected} resource name, got '{name}'")]
    ScopeMismatch {
        operation: SecretOperation,
        expected: ResourceScope,
        name: String,
    },
}

/// Which resource an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    Project,
    Secret,
    Version,
}

impl fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Project => "project",
            Self::Secret => "secret",
            Self::Version => "secret version",
        })
    }
}

/// Secret Manager remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretOperation {
    /// POST /v1/projects/{project}/secrets?secretId={secret}
    CreateSecret,
    /// GET /v1/projects/{project}/secrets
    ListSecrets,
    /// GET /v1/projects/{project}/secrets/{secret}
    GetSecret,
    /// DELETE /v1/projects/{project}/secrets/{secret}
    DeleteSecret,
    /// POST /v1/projects/{project}/secrets/{secret}:addVersion
    AddVersion,
    /// GET /v1/projects/{project}/secrets/{secret}/versions
    ListVersions,
    /// GET /v1/projects/{project}/secrets/{secret}/versions/{version}
    GetVersion,
    /// GET /v1/projects/{project}/secrets/{secret}/versions/{version}:access
    AccessVersion,
    /// POST /v1/projects/{project}/secrets/{secret}/versions/{version}:destroy
    DestroyVersion,
    /// POST /v1/projects/{project}/secrets/{secret}/versions/{version}:enable
    EnableVersion,
    /// POST /v1/projects/{project}/secrets/{secret}/versions/{version}:disable
    DisableVersion,
}

impl SecretOperation {
    /// Short name used for spans and metric labels
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateSecret => "create_secret",
            Self::ListSecrets => "list_secrets",
            Self::GetSecret => "get_secret",
            Self::DeleteSecret => "delete_secret",
            Self::AddVersion => "add_secret_version",
            Self::ListVersions => "list_secret_versions",
            Self::GetVersion => "get_secret_version",
            Self::AccessVersion => "access_secret_version",
            Self::DestroyVersion => "destroy_secret_version",
            Self::EnableVersion => "enable_secret_version",
            Self::DisableVersion => "disable_secret_version",
        }
    }

    pub fn scope(self) -> ResourceScope {
        match self {
            Self::CreateSecret | Self::ListSecrets => ResourceScope::Project,
            Self::GetSecret | Self::DeleteSecret | Self::AddVersion | Self::ListVersions => {
                ResourceScope::Secret
            }
            Self::GetVersion
            | Self::AccessVersion
            | Self::DestroyVersion
            | Self::EnableVersion
            | Self::DisableVersion => ResourceScope::Version,
        }
    }

    pub fn method(self) -> Method {
        match self {
            Self::ListSecrets
            | Self::GetSecret
            | Self::ListVersions
            | Self::GetVersion
            | Self::AccessVersion => Method::GET,
            Self::DeleteSecret => Method::DELETE,
            Self::CreateSecret
            | Self::AddVersion
            | Self::DestroyVersion
            | Self::EnableVersion
            | Self::DisableVersion => Method::POST,
        }
    }

    /// Collection segment or custom-method suffix appended to the resource name
    fn suffix(self) -> &'static str {
        match self {
            Self::CreateSecret | Self::ListSecrets => "/secrets",
            Self::ListVersions => "/versions",
            Self::AddVersion => ":addVersion",
            Self::AccessVersion => ":access",
            Self::DestroyVersion => ":destroy",
            Self::EnableVersion => ":enable",
            Self::DisableVersion => ":disable",
            Self::GetSecret | Self::DeleteSecret | Self::GetVersion => "",
        }
    }

    /// REST path (without leading slash) for a request addressed to `resource`
    ///
    /// The resource name is parsed and checked against the operation's scope.
    pub fn http_path(self, resource: &str) -> Result<String, PathBuilderError> {
        let name = ResourceName::parse(resource)?;
        if name.scope() != self.scope() {
            return Err(PathBuilderError::ScopeMismatch {
                operation: self,
                expected: self.scope(),
                name: resource.to_string(),
            });
        }
        Ok(format!("{API_VERSION}/{name}{}", self.suffix()))
    }
}

/// A parsed `projects/{p}[/secrets/{s}[/versions/{v}]]` resource name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub project: String,
    pub secret: Option<String>,
    pub version: Option<String>,
}

impl ResourceName {
    pub fn parse(name: &str) -> Result<Self, PathBuilderError> {
        let malformed = || PathBuilderError::MalformedName(name.to_string());
        let parts: Vec<&str> = name.split('/').collect();
        let parsed = match parts.as_slice() {
            ["projects", project] => Self {
                project: (*project).to_string(),
                secret: None,
                version: None,
            },
            ["projects", project, "secrets", secret] => Self {
                project: (*project).to_string(),
                secret: Some((*secret).to_string()),
                version: None,
            },
            ["projects", project, "secrets", secret, "versions", version] => Self {
                project: (*project).to_string(),
                secret: Some((*secret).to_string()),
                version: Some((*version).to_string()),
            },
            _ => return Err(malformed()),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn scope(&self) -> ResourceScope {
        match (&self.secret, &self.version) {
            (None, _) => ResourceScope::Project,
            (Some(_), None) => ResourceScope::Secret,
            (Some(_), Some(_)) => ResourceScope::Version,
        }
    }

    /// Name of the enclosing secret (`projects/p/secrets/s`)
    pub fn secret_name(&self) -> Option<String> {
        self.secret
            .as_ref()
            .map(|s| format!("projects/{}/secrets/{s}", self.project))
    }

    fn validate(&self) -> Result<(), PathBuilderError> {
        validate_project_id(&self.project)?;
        if let Some(secret) = &self.secret {
            validate_secret_id(secret)?;
        }
        if let Some(version) = &self.version {
            validate_version(version)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}", self.project)?;
        if let Some(secret) = &self.secret {
            write!(f, "/secrets/{secret}")?;
            if let Some(version) = &self.version {
                write!(f, "/versions/{version}")?;
            }
        }
        Ok(())
    }
}

pub fn validate_project_id(project: &str) -> Result<(), PathBuilderError> {
    if PROJECT_ID_RE.is_match(project) {
        Ok(())
    } else {
        Err(PathBuilderError::InvalidProject(project.to_string()))
    }
}

pub fn validate_secret_id(secret: &str) -> Result<(), PathBuilderError> {
    if SECRET_ID_RE.is_match(secret) {
        Ok(())
    } else {
        Err(PathBuilderError::InvalidSecret(secret.to_string()))
    }
}

pub fn validate_version(version: &str) -> Result<(), PathBuilderError> {
    if VERSION_RE.is_match(version) {
        Ok(())
    } else {
        Err(PathBuilderError::InvalidVersion(version.to_string()))
    }
}

/// Builder for constructing resource names and REST paths
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    operation: Option<SecretOperation>,
    project: Option<String>,
    secret: Option<String>,
    version: Option<String>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(mut self, operation: SecretOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Version id; an empty string is treated as `latest`
    pub fn version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.version = Some(if version.is_empty() {
            LATEST_VERSION.to_string()
        } else {
            version
        });
        self
    }

    /// Resource name placed in the request (`name` or `parent` field)
    pub fn build_resource_name(&self) -> Result<String, PathBuilderError> {
        let operation = self.operation.ok_or(PathBuilderError::MissingOperation)?;
        let project = self
            .project
            .as_deref()
            .ok_or(PathBuilderError::MissingRequiredParameter("project"))?;
        validate_project_id(project)?;

        let scope = operation.scope();
        if scope == ResourceScope::Project {
            return Ok(format!("projects/{project}"));
        }

        let secret = self
            .secret
            .as_deref()
            .ok_or(PathBuilderError::MissingRequiredParameter("secret"))?;
        validate_secret_id(secret)?;
        if scope == ResourceScope::Secret {
            return Ok(format!("projects/{project}/secrets/{secret}"));
        }

        let version = self
            .version
            .as_deref()
            .ok_or(PathBuilderError::MissingRequiredParameter("version"))?;
        validate_version(version)?;
        Ok(format!(
            "projects/{project}/secrets/{secret}/versions/{version}"
        ))
    }

    /// REST path relative to the endpoint, e.g. `v1/projects/p/secrets/s:addVersion`
    pub fn build_http_path(&self) -> Result<String, PathBuilderError> {
        let operation = self.operation.ok_or(PathBuilderError::MissingOperation)?;
        operation.http_path(&self.build_resource_name()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_scoped_paths() {
        let builder = PathBuilder::new()
            .operation(SecretOperation::CreateSecret)
            .project("test-project");
        assert_eq!(builder.build_resource_name().unwrap(), "projects/test-project");
        assert_eq!(
            builder.build_http_path().unwrap(),
            "v1/projects/test-project/secrets"
        );
    }

    #[test]
    fn test_secret_scoped_paths() {
        let cases = [
            (SecretOperation::GetSecret, "v1/projects/test-project/secrets/db"),
            (SecretOperation::DeleteSecret, "v1/projects/test-project/secrets/db"),
            (
                SecretOperation::AddVersion,
                "v1/projects/test-project/secrets/db:addVersion",
            ),
            (
                SecretOperation::ListVersions,
                "v1/projects/test-project/secrets/db/versions",
            ),
        ];
        for (op, expected) in cases {
            let path = PathBuilder::new()
                .operation(op)
                .project("test-project")
                .secret("db")
                .build_http_path()
                .unwrap();
            assert_eq!(path, expected, "{op:?}");
        }
    }

    #[test]
    fn test_version_scoped_paths() {
        let base = "v1/projects/test-project/secrets/db/versions/3";
        let cases = [
            (SecretOperation::GetVersion, String::from(base)),
            (SecretOperation::AccessVersion, format!("{base}:access")),
            (SecretOperation::DestroyVersion, format!("{base}:destroy")),
            (SecretOperation::EnableVersion, format!("{base}:enable")),
            (SecretOperation::DisableVersion, format!("{base}:disable")),
        ];
        for (op, expected) in cases {
            let path = PathBuilder::new()
                .operation(op)
                .project("test-project")
                .secret("db")
                .version("3")
                .build_http_path()
                .unwrap();
            assert_eq!(path, expected, "{op:?}");
        }
    }

    #[test]
    fn test_empty_version_means_latest() {
        let name = PathBuilder::new()
            .operation(SecretOperation::AccessVersion)
            .project("test-project")
            .secret("db")
            .version("")
            .build_resource_name()
            .unwrap();
        assert_eq!(name, "projects/test-project/secrets/db/versions/latest");
    }

    #[test]
    fn test_missing_parameters() {
        let err = PathBuilder::new()
            .operation(SecretOperation::GetVersion)
            .project("test-project")
            .secret("db")
            .build_resource_name()
            .unwrap_err();
        assert_eq!(err, PathBuilderError::MissingRequiredParameter("version"));

        let err = PathBuilder::new()
            .project("test-project")
            .build_resource_name()
            .unwrap_err();
        assert_eq!(err, PathBuilderError::MissingOperation);
    }

    #[test]
    fn test_rejects_invalid_components() {
        let err = PathBuilder::new()
            .operation(SecretOperation::GetSecret)
            .project("test-project")
            .secret("../other")
            .build_resource_name()
            .unwrap_err();
        assert!(matches!(err, PathBuilderError::InvalidSecret(_)));

        let err = PathBuilder::new()
            .operation(SecretOperation::GetVersion)
            .project("test-project")
            .secret("db")
            .version("0")
            .build_resource_name()
            .unwrap_err();
        assert!(matches!(err, PathBuilderError::InvalidVersion(_)));

        assert!(validate_project_id("Bad_Project").is_err());
        assert!(validate_project_id("123456789012").is_ok());
    }

    #[test]
    fn test_parse_round_trips_display() {
        let name = "projects/test-project/secrets/db/versions/7";
        let parsed = ResourceName::parse(name).unwrap();
        assert_eq!(parsed.scope(), ResourceScope::Version);
        assert_eq!(parsed.version.as_deref(), Some("7"));
        assert_eq!(
            parsed.secret_name().as_deref(),
            Some("projects/test-project/secrets/db")
        );
        assert_eq!(parsed.to_string(), name);

        assert!(ResourceName::parse("projects/test-project/topics/t").is_err());
        assert!(ResourceName::parse("").is_err());
    }

    #[test]
    fn test_http_path_checks_scope() {
        let err = SecretOperation::AccessVersion
            .http_path("projects/test-project/secrets/db")
            .unwrap_err();
        assert!(matches!(err, PathBuilderError::ScopeMismatch { .. }));
    }
}
