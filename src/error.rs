//! Classified deployment failures
//!
//! These are the expected ways a provisioning step fails. Stage bodies
//! return them with `?` and the runner treats them as fatal to the run.
//! Anything else a body hits is a defect and keeps its own type.

use resumable::StageFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Expected, classified provisioning failures
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// External command exited non-zero (or was killed by a signal)
    #[error("command failed ({}): {}", exit_label(.exit_status), .argv.join(" "))]
    CommandFailure {
        argv: Vec<String>,
        exit_status: Option<i32>,
    },

    /// External command could not be started at all
    #[error("failed to execute {}: {source}", .argv.join(" "))]
    Spawn {
        argv: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    /// A file the deployment needs could not be written
    #[error("failed to write {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sourcing the activation script did not produce the expected marker
    #[error("activation of {} did not set {sentinel}", .script.display())]
    EnvironmentActivation { script: PathBuf, sentinel: String },

    /// A configuration template could not be read
    #[error("failed to read template {}: {source}", .path.display())]
    TemplateRender {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// User-supplied input that cannot be deployed
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DeploymentError {
    /// Exit status for command failures
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            Self::CommandFailure { exit_status, .. } => *exit_status,
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl From<DeploymentError> for StageFailure {
    fn from(err: DeploymentError) -> Self {
        StageFailure::deployment(err)
    }
}

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeploymentError>;
