#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the slipway build orchestrator
//!
//! This crate provides fine-grained error types organized by domain.
//! Everything user-visible flows through the top-level [`Error`].

use thiserror::Error;

pub mod build;
pub mod config;
pub mod dist;
pub mod ops;
pub mod publish;
pub mod spec;
pub mod vcs;

// Re-export all error types at the root
pub use build::BuildError;
pub use config::ConfigError;
pub use dist::DistError;
pub use ops::OpsError;
pub use publish::PublishError;
pub use spec::SpecError;
pub use vcs::VcsError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("vcs error: {0}")]
    Vcs(#[from] VcsError),

    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("dist error: {0}")]
    Dist(#[from] DistError),

    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("ops error: {0}")]
    Ops(#[from] OpsError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}{}", .path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for slipway operations
pub type Result<T> = std::result::Result<T, Error>;
