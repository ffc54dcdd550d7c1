//! Injected credential store
//!
//! The host pipeline injects the full credential list at process start,
//! either as a mounted JSON file or as an inline JSON value. The list is
//! immutable for the process lifetime and looked up by exact name.

use crate::error::{Error, Result};
use crate::params::Params;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A named bundle of cluster-access secrets and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Unique key the stage refers to this credential by
    pub name: String,

    /// Credential type as labeled by the host pipeline (e.g. "kubernetes-engine")
    #[serde(rename = "type", default)]
    pub credential_type: String,

    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: CredentialProperties,
}

/// The credential payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialProperties {
    /// Service account key material, kept as an opaque JSON blob
    #[serde(rename = "serviceAccountKeyfile")]
    pub service_account_keyfile: String,

    /// Cloud project the cluster lives in
    pub project: String,

    /// Cluster identifier
    pub cluster: String,

    /// Zone of a zonal cluster; mutually exclusive with `region` in practice
    pub zone: String,

    /// Region of a regional cluster
    pub region: String,

    /// Default parameters applied to any stage that uses this credential
    pub defaults: Option<Params>,
}

/// Where the cluster lives: exactly one of zone or region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterLocation {
    Zone(String),
    Region(String),
}

/// The one field this tool needs from the service account key material
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
}

impl Credential {
    /// Returns the cluster location, zone taking priority over region
    ///
    /// A credential with neither is unusable against a cluster; that is a
    /// policy violation surfaced before anything is invoked downstream.
    pub fn location(&self) -> Result<ClusterLocation> {
        if !self.additional_properties.zone.is_empty() {
            Ok(ClusterLocation::Zone(self.additional_properties.zone.clone()))
        } else if !self.additional_properties.region.is_empty() {
            Ok(ClusterLocation::Region(
                self.additional_properties.region.clone(),
            ))
        } else {
            Err(Error::MissingClusterLocation {
                name: self.name.clone(),
            })
        }
    }

    /// Decodes the service account email from the keyfile blob
    ///
    /// The blob stays opaque apart from this one field; a missing or
    /// mistyped `client_email` is reported with the serde field error.
    pub fn service_account_email(&self) -> Result<String> {
        let key: ServiceAccountKey =
            serde_json::from_str(&self.additional_properties.service_account_keyfile).map_err(
                |e| Error::InvalidKeyfile {
                    name: self.name.clone(),
                    message: e.to_string(),
                },
            )?;
        Ok(key.client_email)
    }
}

/// Finds the first credential whose name exactly matches `name`
///
/// Names are expected to be unique but uniqueness is not enforced; the first
/// occurrence in list order wins.
pub fn find_by_name<'a>(credentials: &'a [Credential], name: &str) -> Option<&'a Credential> {
    credentials.iter().find(|c| c.name == name)
}

/// Loads the injected credential list
///
/// A mounted credentials file (always a JSON document) takes priority; the
/// inline value is the fallback for hosts that pass credentials through the
/// environment instead and may be JSON- or YAML-encoded. Having neither is a
/// fatal configuration error.
pub fn load(path: &Path, inline: Option<&str>) -> Result<Vec<Credential>> {
    if path.exists() {
        info!("Reading credentials from file at path {}...", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| {
            Error::CredentialsUnreadable {
                path: path.display().to_string(),
                source,
            }
        })?;
        return serde_json::from_str(&contents)
            .map_err(|e| Error::InvalidCredentials(e.to_string()));
    }

    match inline {
        Some(value) if !value.trim().is_empty() => {
            info!("Reading credentials from inline value...");
            // JSON is a YAML subset, so one parser covers both encodings
            serde_yaml::from_str(value).map_err(|e| Error::InvalidCredentials(e.to_string()))
        }
        _ => Err(Error::CredentialsNotInjected {
            path: path.display().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn credential(name: &str) -> Credential {
        Credential {
            name: name.to_string(),
            credential_type: "kubernetes-engine".to_string(),
            additional_properties: CredentialProperties::default(),
        }
    }

    #[test]
    fn test_find_by_name_returns_first_match() {
        let mut first = credential("gke-tooling");
        first.additional_properties.project = "first-project".to_string();
        let mut duplicate = credential("gke-tooling");
        duplicate.additional_properties.project = "second-project".to_string();

        let credentials = vec![credential("gke-dev"), first, duplicate];
        let found = find_by_name(&credentials, "gke-tooling").unwrap();
        assert_eq!(found.additional_properties.project, "first-project");
    }

    #[test]
    fn test_find_by_name_is_exact_and_case_sensitive() {
        let credentials = vec![credential("gke-prod")];
        assert!(find_by_name(&credentials, "GKE-PROD").is_none());
        assert!(find_by_name(&credentials, "gke-pro").is_none());
        assert!(find_by_name(&credentials, "").is_none());
    }

    #[test]
    fn test_location_prefers_zone() {
        let mut cred = credential("gke-prod");
        cred.additional_properties.zone = "europe-west2-a".to_string();
        cred.additional_properties.region = "europe-west2".to_string();
        assert_eq!(
            cred.location().unwrap(),
            ClusterLocation::Zone("europe-west2-a".to_string())
        );
    }

    #[test]
    fn test_location_falls_back_to_region() {
        let mut cred = credential("gke-prod");
        cred.additional_properties.region = "europe-west2".to_string();
        assert_eq!(
            cred.location().unwrap(),
            ClusterLocation::Region("europe-west2".to_string())
        );
    }

    #[test]
    fn test_location_missing_is_an_error() {
        let cred = credential("gke-prod");
        let err = cred.location().unwrap_err();
        assert!(matches!(err, Error::MissingClusterLocation { .. }));
    }

    #[test]
    fn test_service_account_email() {
        let mut cred = credential("gke-prod");
        cred.additional_properties.service_account_keyfile =
            r#"{"type":"service_account","client_email":"ci@my-project.iam.gserviceaccount.com"}"#
                .to_string();
        assert_eq!(
            cred.service_account_email().unwrap(),
            "ci@my-project.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_service_account_email_missing_field() {
        let mut cred = credential("gke-prod");
        cred.additional_properties.service_account_keyfile =
            r#"{"type":"service_account"}"#.to_string();
        let err = cred.service_account_email().unwrap_err();
        assert!(matches!(err, Error::InvalidKeyfile { .. }));
        assert!(err.to_string().contains("client_email"));
    }

    #[test]
    fn test_service_account_email_mistyped_field() {
        let mut cred = credential("gke-prod");
        cred.additional_properties.service_account_keyfile =
            r#"{"client_email":42}"#.to_string();
        assert!(matches!(
            cred.service_account_email().unwrap_err(),
            Error::InvalidKeyfile { .. }
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name":"gke-tooling","type":"kubernetes-engine","additionalProperties":{{"project":"my-project","cluster":"tooling","zone":"europe-west2-a"}}}}]"#
        )
        .unwrap();

        let credentials = load(file.path(), None).unwrap();
        assert_eq!(credentials.len(), 1);
        assert_eq!(credentials[0].name, "gke-tooling");
        assert_eq!(credentials[0].additional_properties.cluster, "tooling");
    }

    #[test]
    fn test_load_falls_back_to_inline_value() {
        let inline = r#"[{"name":"gke-dev"}]"#;
        let credentials =
            load(Path::new("/nonexistent/kubernetes_engine.json"), Some(inline)).unwrap();
        assert_eq!(credentials[0].name, "gke-dev");
    }

    #[test]
    fn test_load_inline_value_may_be_yaml_encoded() {
        let inline = r#"
- name: gke-dev
  type: kubernetes-engine
  additionalProperties:
    project: my-project
    cluster: dev
    region: europe-west2
"#;
        let credentials =
            load(Path::new("/nonexistent/kubernetes_engine.json"), Some(inline)).unwrap();
        assert_eq!(credentials[0].name, "gke-dev");
        assert_eq!(credentials[0].additional_properties.region, "europe-west2");
    }

    #[test]
    fn test_load_malformed_inline_value_is_a_parse_error() {
        let err = load(
            Path::new("/nonexistent/kubernetes_engine.json"),
            Some("{unclosed: ["),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)));
    }

    #[test]
    fn test_load_nothing_injected() {
        let err = load(Path::new("/nonexistent/kubernetes_engine.json"), None).unwrap_err();
        assert!(matches!(err, Error::CredentialsNotInjected { .. }));
        assert!(err.to_string().contains("trusted"));
    }

    #[test]
    fn test_load_malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load(file.path(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)));
    }
}
