//! Error types for the gkejob core
//!
//! Every condition here is fatal for the invocation: the caller reports the
//! error and exits. There is no retry policy anywhere in this tool.

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving credentials and parameters
#[derive(Debug, Error)]
pub enum Error {
    /// The stage parameter document could not be parsed
    #[error("Failed to parse stage parameters: {0}")]
    InvalidParams(#[from] serde_yaml::Error),

    /// The injected credential list could not be parsed
    #[error("Failed to parse injected credentials: {0}")]
    InvalidCredentials(String),

    /// The credentials file could not be read
    #[error("Failed to read credentials file at {path}: {source}")]
    CredentialsUnreadable {
        /// Path the read was attempted from
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// No credential with the requested name exists in the injected list
    #[error("Credential with name {name} does not exist")]
    CredentialNotFound {
        /// The name that was looked up
        name: String,
    },

    /// The service account keyfile blob is not usable
    #[error("Service account keyfile of credential {name} is invalid: {message}")]
    InvalidKeyfile {
        /// Credential the keyfile belongs to
        name: String,
        /// Field-specific decode failure
        message: String,
    },

    /// The credential names neither a zone nor a region
    #[error("Credential {name} has no zone or region; at least one of them has to be defined")]
    MissingClusterLocation {
        /// The offending credential
        name: String,
    },

    /// No credentials were injected at all
    #[error(
        "Credentials of type kubernetes-engine are not injected at {path}; \
         configure this extension as trusted and inject credentials of type kubernetes-engine"
    )]
    CredentialsNotInjected {
        /// Path that was checked for the credentials file
        path: String,
    },
}

impl Error {
    /// Create a credential-not-found error
    pub fn credential_not_found(name: impl Into<String>) -> Self {
        Self::CredentialNotFound { name: name.into() }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CredentialNotFound { .. })
    }
}
