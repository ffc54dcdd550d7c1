//! gkejob Core
//!
//! Core logic for launching ephemeral jobs in GKE clusters from CI/CD
//! pipeline stages.
//!
//! This crate contains:
//! - Parameter model: stage-supplied parameters with convention-based defaults
//! - Credential store: injected credential list, lookup and validation
//! - Resolution pipeline: layered merge of stage parameters and credential defaults
//! - Job naming: deterministic, length-bounded cluster job identifiers
//! - Command construction: argument vectors for the delegated `kubectl` invocation
//!
//! Note: Process execution, flag parsing and the key-file side effect live in
//! the CLI binary. Everything in this crate is pure and returns typed errors
//! instead of terminating the process.

pub mod command;
pub mod credentials;
pub mod error;
pub mod jobname;
pub mod params;
pub mod resolve;

// Re-export commonly used types
pub use credentials::{ClusterLocation, Credential, find_by_name};
pub use error::{Error, Result};
pub use params::{Params, RemoteSpec};
