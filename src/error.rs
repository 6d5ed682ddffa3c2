//! Error types for the blueprint harness.
//!
//! Errors fall into two classes. Fatal errors (a missing environment
//! variable, an unusable configuration) abort the run before anything is
//! provisioned. Every other error is an assertion failure: it marks the
//! current scenario failed and the run moves on to the next scenario and,
//! eventually, to cleanup.

use std::time::Duration;
use thiserror::Error;

/// Error type for harness operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required environment variable absent or empty
    #[error("Environment variable `{0}` is required and cannot be empty")]
    MissingEnvVar(String),

    /// Configuration rejected before the run started
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Label selector not well-formed or not one of the known workloads
    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),

    /// External command could not be started
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External command exited non-zero
    #[error("Command {command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Command output did not contain what the scenario expects
    #[error("Expected output of `{command}` to contain {expected:?}")]
    UnexpectedOutput { command: String, expected: String },

    /// Poll budget exhausted before the condition held
    #[error("Timed out after {attempts} attempts ({elapsed:?}) waiting for {what}: {last}")]
    Timeout {
        what: String,
        attempts: u32,
        elapsed: Duration,
        last: String,
    },

    /// Secret missing from the target namespace
    #[error("Secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Kubeconfig could not be loaded
    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid selector error
    pub fn invalid_selector(msg: impl Into<String>) -> Self {
        Self::InvalidSelector(msg.into())
    }

    /// Create an unexpected output error
    pub fn unexpected_output(command: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            command: command.into(),
            expected: expected.into(),
        }
    }

    /// Check if this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MissingEnvVar(_) | Error::InvalidConfig(_))
    }
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;
