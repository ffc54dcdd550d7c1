//! gkejob CLI
//!
//! Pipeline extension that runs a container image as an ephemeral job inside
//! a GKE cluster. Invoked once per pipeline stage, it resolves the named
//! injected credential, authenticates `gcloud` against the cluster and
//! delegates the job itself to `kubectl run`.
//!
//! All inputs arrive as flags with environment-variable fallbacks, parsed
//! once into an immutable [`Cli`] value. Every failure propagates up to
//! `main`, the single place the process exits from.

mod process;

use anyhow::{Context, Result};
use clap::Parser;
use gkejob_core::{command, credentials, jobname, resolve};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::process::run_command;

#[derive(Parser)]
#[command(name = "gkejob")]
#[command(about = "Runs a container image as an ephemeral job in a GKE cluster", long_about = None)]
struct Cli {
    /// Stage parameters as a YAML document, built from the stage's custom properties
    #[arg(long, env = "GKEJOB_PARAMS_YAML")]
    params_yaml: String,

    /// Source of the repository (e.g. github.com)
    #[arg(long, env = "GKEJOB_GIT_SOURCE", default_value = "")]
    git_source: String,

    /// Owner of the repository
    #[arg(long, env = "GKEJOB_GIT_OWNER")]
    git_owner: String,

    /// Name of the repository
    #[arg(long, env = "GKEJOB_GIT_NAME")]
    git_name: String,

    /// Build ID
    #[arg(long, env = "GKEJOB_BUILD_ID", default_value = "")]
    build_id: String,

    /// Release ID; takes priority over the build ID in the job name
    #[arg(long, env = "GKEJOB_RELEASE_ID", default_value = "")]
    release_id: String,

    /// Name of the pipeline stage being executed
    #[arg(long, env = "GKEJOB_STAGE_NAME")]
    stage_name: String,

    /// Name of the release section, used by convention to resolve the credential
    #[arg(long, env = "GKEJOB_RELEASE_NAME", default_value = "")]
    release_name: String,

    /// Path to the file with GKE credentials injected by the pipeline
    #[arg(
        long,
        env = "GKEJOB_CREDENTIALS_PATH",
        default_value = "/credentials/kubernetes_engine.json"
    )]
    credentials_path: PathBuf,

    /// Injected credentials as an inline JSON or YAML value, used when no file is mounted
    #[arg(long, env = "GKEJOB_CREDENTIALS_JSON")]
    credentials_json: Option<String>,

    /// Path the service account key file is written to before authentication
    #[arg(long, env = "GKEJOB_KEY_FILE_PATH", default_value = "/key-file.json")]
    key_file_path: PathBuf,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gkejob=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    info!(
        "Starting gkejob for stage {} of {}/{}/{}",
        cli.stage_name, cli.git_source, cli.git_owner, cli.git_name
    );

    info!("Unmarshalling injected credentials...");
    let credentials_path = platform_credentials_path(&cli.credentials_path);
    let credentials =
        credentials::load(&credentials_path, cli.credentials_json.as_deref())?;

    info!("Resolving stage parameters...");
    let (params, credential) =
        resolve::resolve_params(&cli.params_yaml, &cli.release_name, &credentials)?;

    info!("Retrieving service account email from credential {}...", credential.name);
    let email = credential.service_account_email()?;

    // The run command is built before any side effect so a policy violation
    // (no zone or region) aborts with nothing written and nothing invoked
    let get_credentials_args = command::build_get_credentials_args(credential)?;

    let job_name = jobname::derive_job_name(
        jobname::JOB_TYPE_STAGE,
        &cli.build_id,
        &cli.release_id,
        &cli.stage_name,
        &cli.git_owner,
        &cli.git_name,
    );
    let run_args = command::build_run_args(&params, &job_name);

    info!("Storing credential {} key material on disk...", credential.name);
    write_key_file(
        &cli.key_file_path,
        &credential.additional_properties.service_account_keyfile,
    )
    .with_context(|| format!("Failed writing key file to {}", cli.key_file_path.display()))?;

    let key_file = cli.key_file_path.display().to_string();

    info!("Authenticating to google cloud...");
    run_command(
        "gcloud",
        &[
            "auth".to_string(),
            "activate-service-account".to_string(),
            email.clone(),
            "--key-file".to_string(),
            key_file,
        ],
    )?;

    info!("Setting gcloud account to {}...", email);
    run_command(
        "gcloud",
        &["config".to_string(), "set".to_string(), "account".to_string(), email],
    )?;

    info!(
        "Setting gcloud project to {}...",
        credential.additional_properties.project
    );
    run_command(
        "gcloud",
        &[
            "config".to_string(),
            "set".to_string(),
            "project".to_string(),
            credential.additional_properties.project.clone(),
        ],
    )?;

    info!(
        "Getting gke credentials for cluster {}...",
        credential.additional_properties.cluster
    );
    run_command("gcloud", &get_credentials_args)?;

    info!(
        "Running image {} as job {} in cluster {}...",
        params.remote.image, job_name, credential.additional_properties.cluster
    );
    run_command("kubectl", &run_args)?;

    info!("Job {} completed", job_name);
    Ok(())
}

/// Writes the service account key material with owner-only permissions
#[cfg(unix)]
fn write_key_file(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_key_file(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// Adjusts the mounted credentials path for the host platform
///
/// Windows workers mount the credentials under the C: drive.
#[cfg(windows)]
fn platform_credentials_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("C:{}", path.display()))
}

#[cfg(not(windows))]
fn platform_credentials_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}
