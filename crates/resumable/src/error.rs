//! Error types for the resumable crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, recording or running stages
#[derive(Debug, Error)]
pub enum Error {
    /// The ledger file or its directory could not be read or written
    #[error("ledger I/O error at {}: {source}", .path.display())]
    LedgerIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger exists but is not a JSON object of objects
    #[error("malformed ledger at {}: {reason}", .path.display())]
    MalformedLedger { path: PathBuf, reason: String },

    /// A stage reported a deployment failure; the pipeline stopped there
    #[error("stage '{stage}' failed: {source:#}")]
    StageAborted {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    /// A stage hit something that is not a classified deployment failure
    #[error("unexpected error in stage '{stage}': {source:#}")]
    StageDefect {
        stage: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Returns true if this error is the fail-fast deployment abort
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::StageAborted { .. })
    }

    /// Name of the stage this error came from, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Error::StageAborted { stage, .. } | Error::StageDefect { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Result type for resumable operations
pub type Result<T> = std::result::Result<T, Error>;
