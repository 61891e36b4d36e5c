//! Shared HTTP plumbing for repository remotes
//!
//! Uploads carry all three checksum headers and basic auth. Requests are
//! never retried here; transient-failure handling is left to the remote
//! side and to the caller rerunning publish.

use crate::checksums::FileChecksums;
use reqwest::{Client, Response};
use slipway_errors::{Error, PublishError, Result};
use std::path::Path;

/// Basic-auth credentials for a remote
#[derive(Debug, Clone)]
pub(crate) struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// PUT one file to `url` with checksum headers and basic auth
pub(crate) async fn put_file(
    client: &Client,
    url: &str,
    auth: &BasicAuth,
    path: &Path,
    sums: &FileChecksums,
) -> Result<()> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    tracing::debug!(url, bytes = body.len(), "uploading");
    let response = client
        .put(url)
        .basic_auth(&auth.username, Some(&auth.password))
        .header("X-Checksum-Md5", &sums.md5)
        .header("X-Checksum-Sha1", &sums.sha1)
        .header("X-Checksum-Sha256", &sums.sha256)
        .body(body)
        .send()
        .await
        .map_err(|e| request_failed(url, &e))?;
    require_success(url, response).await?;
    Ok(())
}

/// Wrap a transport-level failure with the URL it was addressed to
pub(crate) fn request_failed(url: &str, err: &reqwest::Error) -> Error {
    PublishError::RequestFailed {
        url: url.to_string(),
        message: err.to_string(),
    }
    .into()
}

/// Reject any non-success response, carrying the body snippet
pub(crate) async fn require_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PublishError::UploadFailed {
        url: url.to_string(),
        status: status.to_string(),
        body: body.trim().to_string(),
    }
    .into())
}
