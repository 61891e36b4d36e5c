//! Artifactory-style Maven remote
//!
//! Uploads go through `PUT <base>/artifactory/<repo>/<path>`. Before each
//! upload the storage API is probed for the existing file's checksums so
//! re-publishing an identical artifact becomes a no-op. After each upload
//! a SHA-256 recompute is requested; Artifactory versions that predate
//! native SHA-256 support index the value asynchronously.

use crate::checksums::{self, FileChecksums};
use crate::remote::{self, BasicAuth};
use crate::DistArtifacts;
use reqwest::Client;
use serde::Deserialize;
use slipway_errors::Result;
use slipway_events::{AppEvent, EventEmitter, EventSender, PublishEvent};
use std::path::Path;

/// Maven-style remote reached through Artifactory's REST API
#[derive(Debug, Clone)]
pub struct ArtifactoryDestination {
    /// Base URL, e.g. `https://artifactory.example.com`
    pub url: String,
    /// Repository key uploads land in
    pub repository: String,
    pub username: String,
    pub password: String,
}

/// Checksums the storage API reports for an existing file
#[derive(Debug, Default, Deserialize)]
struct StorageChecksums {
    #[serde(default)]
    md5: String,
    #[serde(default)]
    sha1: String,
    #[serde(default)]
    sha256: String,
}

#[derive(Debug, Deserialize)]
struct StorageInfo {
    #[serde(default)]
    checksums: StorageChecksums,
}

impl ArtifactoryDestination {
    /// Upload every artifact and the POM, returning the artifact URLs
    pub(crate) async fn publish(
        &self,
        client: &Client,
        artifacts: &DistArtifacts,
        tx: &EventSender,
    ) -> Result<Vec<String>> {
        let auth = BasicAuth {
            username: self.username.clone(),
            password: self.password.clone(),
        };
        let mut urls = Vec::with_capacity(artifacts.artifacts.len());
        for file in &artifacts.artifacts {
            urls.push(
                self.upload(client, &auth, &artifacts.remote_dir, file, tx)
                    .await?,
            );
        }
        self.upload(client, &auth, &artifacts.remote_dir, &artifacts.pom, tx)
            .await?;
        Ok(urls)
    }

    /// Final URL a file lands under
    pub(crate) fn file_url(&self, remote_dir: &str, name: &str) -> String {
        format!(
            "{}/artifactory/{}/{remote_dir}/{name}",
            self.base(),
            self.repository
        )
    }

    async fn upload(
        &self,
        client: &Client,
        auth: &BasicAuth,
        remote_dir: &str,
        file: &Path,
        tx: &EventSender,
    ) -> Result<String> {
        let name = crate::file_name(file)?;
        let remote_path = format!("{remote_dir}/{name}");
        let url = self.file_url(remote_dir, &name);
        let sums = checksums::compute(file).await?;

        if let Some(existing) = self.existing_checksums(client, auth, &remote_path).await {
            if checksums_match(&sums, &existing) {
                tx.emit(AppEvent::Publish(PublishEvent::UploadSkipped {
                    file: name,
                    url: url.clone(),
                }));
                return Ok(url);
            }
        }

        tx.emit(AppEvent::Publish(PublishEvent::UploadStarted {
            file: name,
            url: url.clone(),
        }));
        remote::put_file(client, &url, auth, file, &sums).await?;

        if let Err(err) = self.trigger_sha256(client, auth, &remote_path).await {
            tx.emit(AppEvent::Publish(PublishEvent::FollowUpFailed {
                action: format!("SHA-256 recompute for {remote_path}"),
                error: err.to_string(),
            }));
        }
        Ok(url)
    }

    /// Probe the storage API for an already-uploaded file's checksums
    ///
    /// Any failure (absent file, bad credentials, unparsable body) reads
    /// as "not present" and the upload proceeds.
    async fn existing_checksums(
        &self,
        client: &Client,
        auth: &BasicAuth,
        remote_path: &str,
    ) -> Option<StorageChecksums> {
        let url = format!(
            "{}/artifactory/api/storage/{}/{remote_path}",
            self.base(),
            self.repository
        );
        let response = client
            .get(&url)
            .basic_auth(&auth.username, Some(&auth.password))
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let info: StorageInfo = response.json().await.ok()?;
        Some(info.checksums)
    }

    async fn trigger_sha256(
        &self,
        client: &Client,
        auth: &BasicAuth,
        remote_path: &str,
    ) -> Result<()> {
        let url = format!("{}/artifactory/api/checksums/sha256", self.base());
        let body = serde_json::json!({
            "repoKey": self.repository,
            "path": remote_path,
        });
        let response = client
            .post(&url)
            .basic_auth(&auth.username, Some(&auth.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| remote::request_failed(&url, &e))?;
        remote::require_success(&url, response).await?;
        Ok(())
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// An upload is skippable when at least one remote checksum matches and
/// none of the non-empty remote checksums differ
fn checksums_match(local: &FileChecksums, remote: &StorageChecksums) -> bool {
    let pairs = [
        (&remote.md5, &local.md5),
        (&remote.sha1, &local.sha1),
        (&remote.sha256, &local.sha256),
    ];
    let any_match = pairs.iter().any(|(r, l)| !r.is_empty() && r == l);
    let none_differ = pairs.iter().all(|(r, l)| r.is_empty() || r == l);
    any_match && none_differ
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> FileChecksums {
        FileChecksums {
            md5: "aaa".to_string(),
            sha1: "bbb".to_string(),
            sha256: "ccc".to_string(),
        }
    }

    fn remote(md5: &str, sha1: &str, sha256: &str) -> StorageChecksums {
        StorageChecksums {
            md5: md5.to_string(),
            sha1: sha1.to_string(),
            sha256: sha256.to_string(),
        }
    }

    #[test]
    fn all_matching_skips() {
        assert!(checksums_match(&local(), &remote("aaa", "bbb", "ccc")));
    }

    #[test]
    fn one_match_with_others_absent_skips() {
        assert!(checksums_match(&local(), &remote("aaa", "", "")));
        assert!(checksums_match(&local(), &remote("", "", "ccc")));
    }

    #[test]
    fn any_differing_checksum_uploads() {
        assert!(!checksums_match(&local(), &remote("aaa", "WRONG", "")));
        assert!(!checksums_match(&local(), &remote("WRONG", "bbb", "ccc")));
    }

    #[test]
    fn all_absent_uploads() {
        assert!(!checksums_match(&local(), &remote("", "", "")));
    }
}
