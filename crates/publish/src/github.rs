//! Release-host sink for GitHub-style APIs
//!
//! Publishing creates a release tagged with the product version and
//! attaches every dist artifact as an asset. Releases are immutable from
//! this tool's point of view, so the version must identify an exact
//! clean tag before any network call is made.

use crate::remote;
use crate::DistArtifacts;
use reqwest::header;
use reqwest::Client;
use serde::Deserialize;
use slipway_errors::{Error, PublishError, Result};
use slipway_events::{AppEvent, EventEmitter, EventSender, PublishEvent};
use slipway_types::{ProductSpec, VersionInfo, UNSPECIFIED_VERSION};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT_HEADER: &str = "slipway";

/// Size of chunks for streaming asset uploads
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Release host reached through a GitHub-style REST API
#[derive(Debug, Clone)]
pub struct GitHubDestination {
    /// API base URL, e.g. `https://api.github.com`
    pub api_url: String,
    pub user: String,
    pub token: String,
    /// Repository owner; the authenticating user when empty
    pub owner: String,
    pub repository: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    upload_url: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct Asset {
    browser_download_url: String,
}

impl GitHubDestination {
    /// Create the release for this product version and upload every
    /// artifact as an asset
    pub(crate) async fn publish(
        &self,
        client: &Client,
        spec: &ProductSpec,
        artifacts: &DistArtifacts,
        tx: &EventSender,
    ) -> Result<Vec<String>> {
        require_releasable(&spec.version_info)?;
        let release = self.create_release(client, spec, tx).await?;
        for file in &artifacts.artifacts {
            self.upload_asset(client, &release.upload_url, file, tx)
                .await?;
        }
        // Release assets are not repository artifacts, so no URLs flow on
        Ok(Vec::new())
    }

    async fn create_release(
        &self,
        client: &Client,
        spec: &ProductSpec,
        tx: &EventSender,
    ) -> Result<Release> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.base(),
            self.owner(),
            self.repository
        );
        let body = serde_json::json!({
            "tag_name": spec.version,
            "name": spec.version,
        });
        tracing::debug!(url, version = %spec.version, "creating release");
        let response = client
            .post(&url)
            .header(header::ACCEPT, ACCEPT_HEADER)
            .header(header::AUTHORIZATION, self.auth_header())
            .header(header::USER_AGENT, USER_AGENT_HEADER)
            .json(&body)
            .send()
            .await
            .map_err(|e| remote::request_failed(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if text.contains("already_exists") {
                return Err(PublishError::ReleaseAlreadyExists {
                    version: spec.version.clone(),
                }
                .into());
            }
            return Err(PublishError::UploadFailed {
                url,
                status: status.to_string(),
                body: text.trim().to_string(),
            }
            .into());
        }

        let release: Release = response
            .json()
            .await
            .map_err(|e| remote::request_failed(&url, &e))?;
        tx.emit(AppEvent::Publish(PublishEvent::ReleaseCreated {
            product: spec.name.clone(),
            url: release.html_url.clone(),
        }));
        Ok(release)
    }

    async fn upload_asset(
        &self,
        client: &Client,
        upload_url_template: &str,
        file: &Path,
        tx: &EventSender,
    ) -> Result<()> {
        let name = crate::file_name(file)?;
        // The API hands back an RFC 6570 template; only the base is used
        let base = upload_url_template
            .split('{')
            .next()
            .unwrap_or(upload_url_template);
        let url = format!("{base}?name={name}");

        let total = tokio::fs::metadata(file)
            .await
            .map_err(|e| Error::io_with_path(&e, file))?
            .len();
        let handle = File::open(file)
            .await
            .map_err(|e| Error::io_with_path(&e, file))?;

        tx.emit(AppEvent::Publish(PublishEvent::UploadStarted {
            file: name.clone(),
            url: url.clone(),
        }));
        let response = client
            .post(&url)
            .header(header::ACCEPT, ACCEPT_HEADER)
            .header(header::AUTHORIZATION, self.auth_header())
            .header(header::USER_AGENT, USER_AGENT_HEADER)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, total)
            .body(progress_body(handle, total, name.clone(), tx.clone()))
            .send()
            .await
            .map_err(|e| remote::request_failed(&url, &e))?;
        let response = remote::require_success(&url, response).await?;

        let asset: Asset = response
            .json()
            .await
            .map_err(|e| remote::request_failed(&url, &e))?;
        tx.emit(AppEvent::Publish(PublishEvent::AssetAvailable {
            file: name,
            url: asset.browser_download_url,
        }));
        Ok(())
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.token)
    }

    fn owner(&self) -> &str {
        if self.owner.is_empty() {
            &self.user
        } else {
            &self.owner
        }
    }

    fn base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

/// Body that reports an `UploadProgress` event per chunk read
fn progress_body(file: File, total: u64, name: String, tx: EventSender) -> reqwest::Body {
    let stream = futures::stream::unfold((file, 0u64), move |(mut file, uploaded)| {
        let name = name.clone();
        let tx = tx.clone();
        async move {
            let mut buffer = vec![0; CHUNK_SIZE];
            match file.read(&mut buffer).await {
                Ok(0) => None,
                Ok(n) => {
                    buffer.truncate(n);
                    let uploaded = uploaded + n as u64;
                    tx.emit(AppEvent::Publish(PublishEvent::UploadProgress {
                        file: name,
                        uploaded,
                        total,
                    }));
                    Some((Ok(buffer), (file, uploaded)))
                }
                Err(err) => Some((Err(err), (file, uploaded))),
            }
        }
    });
    reqwest::Body::wrap_stream(stream)
}

/// A release requires an exact, clean, non-snapshot tag
fn require_releasable(info: &VersionInfo) -> Result<()> {
    let reason = if info.version == UNSPECIFIED_VERSION {
        Some("version is unspecified")
    } else if info.is_dirty() {
        Some("working tree has uncommitted changes")
    } else if info.is_snapshot() {
        Some("version is a snapshot")
    } else if info.revision != "0" {
        Some("HEAD is not at a release tag")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(PublishError::NotReleasable {
            version: info.version.clone(),
            reason: reason.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}
