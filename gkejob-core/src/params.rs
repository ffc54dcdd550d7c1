//! Stage parameter model
//!
//! Parameters are passed to this extension as a YAML document built from the
//! custom properties of the pipeline stage. Two document shapes are accepted:
//! the current one with a nested `remote` block, and a legacy flat one that
//! sets `remoteImage`/`remoteEnv` at the top level. Both converge to the
//! nested shape during defaulting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shell used for remote commands when the stage does not set one
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Parameters supplied by the pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Name of the injected credential to authenticate with
    pub credentials: String,

    /// Kubernetes namespace the job is created in
    pub namespace: String,

    /// What to run inside the cluster
    pub remote: RemoteSpec,

    /// Legacy flat schema: container image at the top level
    #[serde(rename = "remoteImage", skip_serializing_if = "String::is_empty")]
    pub remote_image: String,

    /// Legacy flat schema: environment variables at the top level
    #[serde(rename = "remoteEnv", skip_serializing_if = "BTreeMap::is_empty")]
    pub remote_env: BTreeMap<String, String>,
}

/// The remote execution spec: image, shell, commands and environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSpec {
    /// Container image to run
    pub image: String,

    /// Shell the commands are handed to
    pub shell: String,

    /// Commands executed in sequence inside the container
    pub commands: Vec<String>,

    /// Environment variables set on the job
    pub env: BTreeMap<String, String>,
}

impl Params {
    /// Fills in empty fields with convention-based defaults
    ///
    /// - An empty credential name becomes `gke-<releaseName>` when a release
    ///   name is available; with no release name it stays empty and the later
    ///   credential lookup reports the error.
    /// - An empty shell becomes [`DEFAULT_SHELL`].
    ///
    /// Also folds the legacy flat fields into the nested `remote` block.
    /// No other field receives a default. Idempotent.
    pub fn set_defaults(&mut self, release_name: &str) {
        self.normalize();

        if self.credentials.is_empty() && !release_name.is_empty() {
            self.credentials = format!("gke-{release_name}");
        }

        if self.remote.shell.is_empty() {
            self.remote.shell = DEFAULT_SHELL.to_string();
        }
    }

    /// Folds the legacy flat fields into the nested `remote` block
    ///
    /// The nested field wins when both shapes are present.
    fn normalize(&mut self) {
        if self.remote.image.is_empty() && !self.remote_image.is_empty() {
            self.remote.image = std::mem::take(&mut self.remote_image);
        }
        if self.remote.env.is_empty() && !self.remote_env.is_empty() {
            self.remote.env = std::mem::take(&mut self.remote_env);
        }
    }
}

/// Partial view of the stage document, used to re-apply the document on top
/// of credential-supplied defaults
///
/// Only fields the document actually sets are `Some`; applying the patch
/// leaves every other field of the base untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ParamsPatch {
    credentials: Option<String>,
    namespace: Option<String>,
    remote: Option<RemotePatch>,
    #[serde(rename = "remoteImage")]
    remote_image: Option<String>,
    #[serde(rename = "remoteEnv")]
    remote_env: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RemotePatch {
    image: Option<String>,
    shell: Option<String>,
    commands: Option<Vec<String>>,
    env: Option<BTreeMap<String, String>>,
}

impl ParamsPatch {
    /// Applies the patch onto `base`, overwriting only fields the stage
    /// document specified
    ///
    /// Environment mappings merge key-wise: keys the document sets overwrite
    /// the base entry, base entries absent from the document survive.
    pub(crate) fn apply(self, base: &mut Params) {
        if let Some(credentials) = self.credentials {
            base.credentials = credentials;
        }
        if let Some(namespace) = self.namespace {
            base.namespace = namespace;
        }
        if let Some(remote) = self.remote {
            if let Some(image) = remote.image {
                base.remote.image = image;
            }
            if let Some(shell) = remote.shell {
                base.remote.shell = shell;
            }
            if let Some(commands) = remote.commands {
                base.remote.commands = commands;
            }
            if let Some(env) = remote.env {
                base.remote.env.extend(env);
            }
        }
        // Legacy flat fields patch the nested block directly
        if let Some(image) = self.remote_image {
            base.remote.image = image;
        }
        if let Some(env) = self.remote_env {
            base.remote.env.extend(env);
        }
    }
}
