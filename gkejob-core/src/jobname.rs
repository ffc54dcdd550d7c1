//! Deterministic job-name derivation
//!
//! Kubernetes object names are capped at 63 characters, so the derived name
//! is budgeted: the job type, id and stage name are kept whole and the
//! repository component absorbs the truncation.

use regex::Regex;
use std::sync::LazyLock;

/// Kubernetes label-value length cap
const MAX_JOB_NAME_LENGTH: usize = 63;

/// Job type tag for stage-launched jobs
pub const JOB_TYPE_STAGE: &str = "stage";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9]+").expect("static pattern"));

/// Collapses every run of characters outside `[a-zA-Z0-9]` to a single
/// hyphen and strips hyphens the collapse left at either end, so joining
/// components never produces doubled hyphens
fn sanitize(component: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(component, "-")
        .trim_matches('-')
        .to_string()
}

/// Derives the cluster job name for this invocation
///
/// The release id takes priority over the build id. Runs of characters
/// outside `[a-zA-Z0-9]` in the stage name and the `owner/repo` pair are
/// collapsed to single hyphens, the repository component is truncated to
/// whatever the 63-character cap leaves over (mid-word, no word-boundary
/// awareness), and the whole name is lowercased.
///
/// When the stage name and id alone exceed the cap, the repository component
/// is dropped entirely and the result may still be longer than 63
/// characters; that condition is left for the cluster to reject.
pub fn derive_job_name(
    job_type: &str,
    build_id: &str,
    release_id: &str,
    stage_name: &str,
    owner: &str,
    repo_name: &str,
) -> String {
    let id = if release_id.is_empty() {
        build_id
    } else {
        release_id
    };

    let repo = sanitize(&format!("{owner}/{repo_name}"));
    let stage = sanitize(stage_name);

    // Sanitized components are pure ASCII, so byte indexing is safe
    let budget = MAX_JOB_NAME_LENGTH
        .saturating_sub(job_type.len() + 1 + id.len() + 1 + stage.len() + 1);
    let repo = if repo.len() > budget {
        &repo[..budget]
    } else {
        repo.as_str()
    };

    format!("{job_type}-{stage}-{repo}-{id}").to_lowercase()
}
