//! Build engine error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("build failed for {product} ({os_arch}): {message}")]
    CompileFailed {
        product: String,
        os_arch: String,
        message: String,
    },

    #[error("install failed for {product} ({os_arch}): {message}")]
    InstallFailed {
        product: String,
        os_arch: String,
        message: String,
    },

    #[error(
        "failed to install a cross-compiled standard library for {os_arch}. \
         Run `{suggested}` to populate the cache, then retry. Underlying error: {underlying}"
    )]
    StdlibCacheNotWritable {
        os_arch: String,
        suggested: String,
        underlying: String,
    },

    #[error("script failed with exit code {code}")]
    ScriptFailed { code: i32 },

    #[error("failed to execute script: {message}")]
    ScriptExecFailed { message: String },

    #[error("run failed: {message}")]
    RunFailed { message: String },

    #[error("no main package files found in {path}")]
    NoMainFiles { path: String },

    #[error("multiple files declare a main function in {path}: {candidates:?}")]
    MultipleMainFiles {
        path: String,
        candidates: Vec<String>,
    },
}
