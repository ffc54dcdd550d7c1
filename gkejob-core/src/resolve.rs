//! Parameter resolution pipeline
//!
//! Effective parameters are resolved in strict layers:
//! 1. the stage document, parsed and defaulted,
//! 2. replaced wholesale by the credential's embedded defaults when present,
//! 3. the stage document re-applied on top, so the stage always wins.
//!
//! Defaulting runs once, before the credential is known; the credential's
//! defaults can therefore never substitute a different convention-based
//! credential name or shell than the one already computed.

use crate::credentials::{Credential, find_by_name};
use crate::error::{Error, Result};
use crate::params::{Params, ParamsPatch};
use tracing::info;

/// Resolves the effective parameters and the credential they name
///
/// Fails fatally on a malformed document or a missing credential; there is
/// no partial recovery.
pub fn resolve_params<'a>(
    params_yaml: &str,
    release_name: &str,
    credentials: &'a [Credential],
) -> Result<(Params, &'a Credential)> {
    let mut params: Params = parse_document(params_yaml)?;
    params.set_defaults(release_name);

    let credential = find_by_name(credentials, &params.credentials)
        .ok_or_else(|| Error::credential_not_found(&params.credentials))?;

    if let Some(defaults) = &credential.additional_properties.defaults {
        info!("Using defaults from credential {}...", credential.name);
        params = defaults.clone();
    }

    // Re-apply the stage document so its fields always win over the
    // credential-supplied defaults
    let patch: ParamsPatch = parse_document(params_yaml)?;
    patch.apply(&mut params);

    Ok((params, credential))
}

/// Parses a YAML document, treating an empty document as all-absent
///
/// Stages with no custom properties hand this tool an empty string, which
/// `serde_yaml` rejects as a bare EOF.
fn parse_document<T: serde::de::DeserializeOwned + Default>(doc: &str) -> Result<T> {
    if doc.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_str(doc)?)
}
