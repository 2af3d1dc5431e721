use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors returned by a transition tool.
#[derive(Debug, Error)]
pub enum TransitionToolError {
    /// The tool binary could not be started.
    #[error("failed to run `{}`: {source}", binary.display())]
    Spawn {
        /// Binary that was executed.
        binary: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The tool exited with a failure status.
    #[error("transition tool exited with {status}: {stderr}")]
    Failed {
        /// Exit status as reported by the process.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
    /// Reading or writing tool files failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Tool input or output is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Any other failure reported by a tool implementation.
    #[error("{0}")]
    Custom(String),
}
