//! Publish engine error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PublishError {
    #[error("group ID is required for {product} publish")]
    GroupIdRequired { product: String },

    #[error("upload to {url} failed: {status}{}", body_snippet(.body))]
    UploadFailed {
        url: String,
        status: String,
        body: String,
    },

    #[error("request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    #[error("cannot create release for version {version}: {reason}")]
    NotReleasable { version: String, reason: String },

    #[error("release {version} already exists")]
    ReleaseAlreadyExists { version: String },

    #[error("almanac unit for {product}/{branch}/{revision} already published with different url {existing}")]
    AlmanacUrlConflict {
        product: String,
        branch: String,
        revision: String,
        existing: String,
    },

    #[error("almanac request failed: {message}")]
    AlmanacFailed { message: String },

    #[error("{}", .messages.join("\n"))]
    Batch { messages: Vec<String> },
}

fn body_snippet(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}
