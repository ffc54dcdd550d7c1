//! Argument construction for the delegated CLI invocations
//!
//! This tool never talks to the cluster itself; it builds argument vectors
//! and hands them to `gcloud` and `kubectl`. Only construction lives here so
//! it stays testable without spawning anything.

use crate::credentials::{ClusterLocation, Credential};
use crate::error::Result;
use crate::params::Params;

/// Builds the `kubectl run` argument vector for the ephemeral job
///
/// One `--env KEY=VALUE` pair per environment variable (flag order carries no
/// meaning), and a trailing `--command -- <shell> -c 'set -e; ...'` segment
/// only when the stage supplied commands. The `set -e` prefix makes the
/// remote shell abort on the first failing command.
pub fn build_run_args(params: &Params, job_name: &str) -> Vec<String> {
    let remote = &params.remote;

    let mut args = vec![
        "run".to_string(),
        job_name.to_string(),
        "--rm=true".to_string(),
        "--restart=Never".to_string(),
        "-i".to_string(),
        format!("--image={}", remote.image),
        "-n".to_string(),
        params.namespace.clone(),
    ];

    for (key, value) in &remote.env {
        args.push("--env".to_string());
        args.push(format!("{key}={value}"));
    }

    if !remote.commands.is_empty() {
        let combined = format!("set -e; {}", remote.commands.join(";"));
        args.extend([
            "--command".to_string(),
            "--".to_string(),
            remote.shell.clone(),
            "-c".to_string(),
            combined,
        ]);
    }

    args
}

/// Builds the `gcloud container clusters get-credentials` argument vector
///
/// Fails when the credential names neither a zone nor a region, before any
/// ambiguous invocation reaches `gcloud`.
pub fn build_get_credentials_args(credential: &Credential) -> Result<Vec<String>> {
    let mut args = vec![
        "container".to_string(),
        "clusters".to_string(),
        "get-credentials".to_string(),
        credential.additional_properties.cluster.clone(),
    ];

    match credential.location()? {
        ClusterLocation::Zone(zone) => args.extend(["--zone".to_string(), zone]),
        ClusterLocation::Region(region) => args.extend(["--region".to_string(), region]),
    }

    Ok(args)
}
