//! Source-control adapter error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum VcsError {
    #[error("failed to run {command}: {message}")]
    CommandFailed { command: String, message: String },

    #[error("{command} exited with {code}: {output}")]
    NonZeroExit {
        command: String,
        code: i32,
        output: String,
    },
}
