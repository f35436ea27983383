//! # SMCTL CLI
//!
//! Command-line interface over the Secret Manager helpers.
//!
//! ## Usage
//!
//! ```bash
//! # Create a secret with an initial version
//! smctl --project my-project create db-password --data hunter2
//!
//! # Read the latest version
//! smctl --project my-project get db-password
//!
//! # Add a version from a file
//! smctl --project my-project add-version tls-key --file ./key.pem
//!
//! # Disable, enable or destroy a version
//! smctl --project my-project disable db-password 2
//! smctl --project my-project destroy db-password 1
//!
//! # List secrets and versions
//! smctl --project my-project list
//! smctl --project my-project versions db-password
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use secret_manager_client::client::RestClientFactory;
use secret_manager_client::config::ClientConfig;
use secret_manager_client::model::{Secret, SecretVersion};
use secret_manager_client::observability::{init_tracing, metrics};
use secret_manager_client::SecretManager;

/// Google Cloud Secret Manager CLI
#[derive(Parser)]
#[command(name = "smctl")]
#[command(
    about = "Manage Google Cloud Secret Manager secrets and versions",
    long_about = None,
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("BUILD_GIT_HASH"),
        ", built ",
        env!("BUILD_DATETIME"),
        ")"
    ),
    after_help = "\
Configuration is read from the environment (GCP_PROJECT_ID, GCP_ACCESS_TOKEN,
GCP_SECRET_MANAGER_ENDPOINT, SECRET_MANAGER_REPLICA_LOCATIONS, LOG_LEVEL, ...).

Examples:
  smctl --project my-project create api-key --data s3cr3t
  smctl --project my-project get api-key 2
  smctl --project my-project exists api-key && echo present
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project that owns the secrets (overrides GCP_PROJECT_ID)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Secret Manager endpoint (overrides GCP_SECRET_MANAGER_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Print Prometheus metrics for the calls made to stderr on exit
    #[arg(long, global = true)]
    print_metrics: bool,
}

/// Payload source; at most one of `--data` and `--file`
#[derive(Args)]
#[group(multiple = false)]
struct PayloadArgs {
    /// Payload given inline
    #[arg(long)]
    data: Option<String>,

    /// Read the payload from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

impl PayloadArgs {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        match (&self.data, &self.file) {
            (Some(data), _) => Ok(Some(data.clone().into_bytes())),
            (None, Some(path)) => tokio::fs::read(path)
                .await
                .map(Some)
                .with_context(|| format!("Failed to read payload from {}", path.display())),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a secret, optionally with a first version
    Create {
        #[arg(value_name = "SECRET")]
        name: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Add a new version to an existing secret
    #[command(name = "add-version")]
    AddVersion {
        #[arg(value_name = "SECRET")]
        name: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Write the payload of a version to stdout
    Get {
        #[arg(value_name = "SECRET")]
        name: String,
        /// Version id (defaults to latest)
        #[arg(value_name = "VERSION", default_value = "")]
        version: String,
    },
    /// Exit with status 0 if the secret exists, 1 otherwise
    Exists {
        #[arg(value_name = "SECRET")]
        name: String,
    },
    /// Delete a secret and all of its versions
    Delete {
        #[arg(value_name = "SECRET")]
        name: String,
    },
    /// Irreversibly destroy a version's payload
    Destroy {
        #[arg(value_name = "SECRET")]
        name: String,
        #[arg(value_name = "VERSION")]
        version: String,
    },
    /// Enable a disabled version
    Enable {
        #[arg(value_name = "SECRET")]
        name: String,
        #[arg(value_name = "VERSION")]
        version: String,
    },
    /// Disable a version
    Disable {
        #[arg(value_name = "SECRET")]
        name: String,
        #[arg(value_name = "VERSION")]
        version: String,
    },
    /// Show version metadata
    Describe {
        #[arg(value_name = "SECRET")]
        name: String,
        /// Version id (defaults to latest)
        #[arg(value_name = "VERSION", default_value = "")]
        version: String,
    },
    /// List secrets in the project
    List,
    /// List versions of a secret
    Versions {
        #[arg(value_name = "SECRET")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Configure rustls crypto provider before any TLS connection is made;
    // an already installed provider is kept
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(project) = &cli.project {
        config = config.with_project(project.as_str());
    }
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint.as_str());
    }

    init_tracing(&config).context("Failed to initialize logging")?;
    metrics::register_metrics().context("Failed to register metrics")?;
    debug!("smctl configuration: {:?}", config);

    let factory = RestClientFactory::new(config.clone());
    let manager = SecretManager::connect(&factory, &config)
        .await
        .context("Failed to create Secret Manager client")?;

    let result = run_and_close(&manager, cli.command).await;

    if cli.print_metrics {
        eprint!("{}", metrics::gather_metrics().context("Failed to gather metrics")?);
    }

    result
}

/// Runs the command and closes the client; a command error wins over a close error
async fn run_and_close(manager: &SecretManager, command: Commands) -> Result<ExitCode> {
    let result = run(manager, command).await;
    let closed = manager.close().await.context("Failed to close client");
    match (result, closed) {
        (Err(e), Err(close_err)) => {
            warn!("{close_err:#}");
            Err(e)
        }
        (result, closed) => {
            closed?;
            result
        }
    }
}

async fn run(manager: &SecretManager, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Create { name, payload } => {
            match payload.read().await? {
                Some(data) => {
                    let version = manager
                        .create_secret_with_data(&name, &data)
                        .await
                        .with_context(|| format!("Failed to create secret '{name}'"))?;
                    println!("Created secret '{name}' with version {}", version.version_id());
                }
                None => {
                    let secret = manager
                        .create_empty_secret(&name)
                        .await
                        .with_context(|| format!("Failed to create secret '{name}'"))?;
                    println!("Created secret {}", secret.name);
                }
            }
        }
        Commands::AddVersion { name, payload } => {
            let Some(data) = payload.read().await? else {
                bail!("A payload is required: pass --data or --file");
            };
            let version = manager
                .add_new_secret_version(&name, &data)
                .await
                .with_context(|| format!("Failed to add a version to '{name}'"))?;
            println!("Added version {} to '{name}'", version.version_id());
        }
        Commands::Get { name, version } => {
            let payload = manager
                .get_secret(&name, &version)
                .await
                .with_context(|| format!("Failed to read secret '{name}'"))?;
            write_payload(std::io::stdout().lock(), payload.data())
                .context("Failed to write payload to stdout")?;
        }
        Commands::Exists { name } => {
            if !manager.secret_exists(&name).await {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Delete { name } => {
            manager
                .delete_secret_and_versions(&name)
                .await
                .with_context(|| format!("Failed to delete secret '{name}'"))?;
            println!("Deleted secret '{name}'");
        }
        Commands::Destroy { name, version } => {
            let version = manager
                .delete_secret_version(&name, &version)
                .await
                .with_context(|| format!("Failed to destroy version {version} of '{name}'"))?;
            print_version(&version);
        }
        Commands::Enable { name, version } => {
            let version = manager
                .enable_secret(&name, &version)
                .await
                .with_context(|| format!("Failed to enable version {version} of '{name}'"))?;
            print_version(&version);
        }
        Commands::Disable { name, version } => {
            let version = manager
                .disable_secret(&name, &version)
                .await
                .with_context(|| format!("Failed to disable version {version} of '{name}'"))?;
            print_version(&version);
        }
        Commands::Describe { name, version } => {
            let version = manager
                .get_secret_metadata(&name, &version)
                .await
                .with_context(|| format!("Failed to describe '{name}'"))?;
            print_version(&version);
        }
        Commands::List => {
            let secrets = manager
                .list_secrets()
                .await
                .context("Failed to list secrets")?;
            print_secrets(&secrets);
        }
        Commands::Versions { name } => {
            let versions = manager
                .list_secret_versions(&name)
                .await
                .with_context(|| format!("Failed to list versions of '{name}'"))?;
            print_versions(&versions);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Raw payload bytes, no trailing newline
fn write_payload(mut out: impl Write, data: &[u8]) -> std::io::Result<()> {
    out.write_all(data)?;
    out.flush()
}

fn format_time(time: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_version(version: &SecretVersion) {
    println!("Name:        {}", version.name);
    println!("State:       {}", version.state);
    println!("Created:     {}", format_time(version.create_time.as_ref()));
    if version.destroy_time.is_some() {
        println!("Destroyed:   {}", format_time(version.destroy_time.as_ref()));
    }
    if !version.etag.is_empty() {
        println!("Etag:        {}", version.etag);
    }
}

fn print_secrets(secrets: &[Secret]) {
    if secrets.is_empty() {
        println!("No secrets found.");
        return;
    }

    println!("{:<40} {:<25} {:<12}", "NAME", "CREATED", "REPLICATION");
    println!("{}", "-".repeat(79));
    for secret in secrets {
        let replication = match &secret.replication {
            Some(r) if r.user_managed.is_some() => "user-managed",
            Some(_) => "automatic",
            None => "-",
        };
        println!(
            "{:<40} {:<25} {:<12}",
            secret.secret_id(),
            format_time(secret.create_time.as_ref()),
            replication
        );
    }
}

fn print_versions(versions: &[SecretVersion]) {
    if versions.is_empty() {
        println!("No versions found.");
        return;
    }

    println!("{:<10} {:<12} {:<25}", "VERSION", "STATE", "CREATED");
    println!("{}", "-".repeat(49));
    for version in versions {
        println!(
            "{:<10} {:<12} {:<25}",
            version.version_id(),
            version.state.to_string(),
            format_time(version.create_time.as_ref())
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::CommandFactory;
    use secret_manager_client::client::{MockSecretClient, SecretMethod};
    use secret_manager_client::error::ApiError;

    use super::*;

    fn setup() -> (Arc<MockSecretClient>, SecretManager) {
        let mock = Arc::new(MockSecretClient::new());
        let client = Arc::clone(&mock);
        (mock, SecretManager::new(client, "test-project"))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_get_defaults_to_latest_version() {
        let cli = Cli::try_parse_from(["smctl", "--project", "p", "get", "db-password"]).unwrap();
        match cli.command {
            Commands::Get { name, version } => {
                assert_eq!(name, "db-password");
                assert_eq!(version, "");
            }
            _ => panic!("expected the get subcommand"),
        }
        assert_eq!(cli.project.as_deref(), Some("p"));
    }

    #[test]
    fn test_payload_sources_are_exclusive() {
        let result = Cli::try_parse_from([
            "smctl", "create", "api-key", "--data", "x", "--file", "./key.pem",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_exists_exit_status() {
        let (_mock, manager) = setup();
        manager.create_empty_secret("present").await.unwrap();

        let code = run(&manager, Commands::Exists { name: "present".to_string() })
            .await
            .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let code = run(&manager, Commands::Exists { name: "absent".to_string() })
            .await
            .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_payload_is_written_verbatim() {
        let data = [0xff, 0x00, b'h', b'i', b'\n'];
        let mut out = Vec::new();
        write_payload(&mut out, &data).unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_command_error_wins_over_close_error() {
        let (mock, manager) = setup();
        mock.fail_on(SecretMethod::Close, ApiError::new(503, "UNAVAILABLE", "closing"))
            .await;

        let err = run_and_close(&manager, Commands::Delete { name: "missing".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete secret 'missing'");
        assert_eq!(mock.calls_for(SecretMethod::Close).await.len(), 1);
    }

    #[tokio::test]
    async fn test_close_error_is_reported_after_success() {
        let (mock, manager) = setup();
        manager.create_empty_secret("present").await.unwrap();
        mock.fail_on(SecretMethod::Close, ApiError::new(503, "UNAVAILABLE", "closing"))
            .await;

        let err = run_and_close(&manager, Commands::Exists { name: "present".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to close client");
    }
}
