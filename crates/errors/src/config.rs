//! Configuration error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    ParseFailed { path: String, message: String },

    #[error("invalid exclude pattern {pattern}: {message}")]
    InvalidExcludePattern { pattern: String, message: String },

    #[error("invalid os-arch {input:?}: expected os-arch (for example linux-amd64)")]
    InvalidOsArch { input: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}
