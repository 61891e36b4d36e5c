//! Bintray-style remote
//!
//! Content lands under `<base>/content/<subject>/<repo>/<product>/<version>/`
//! followed by the Maven-style path. Uploaded content sits unpublished
//! until the publish follow-up releases it; the downloads-list follow-up
//! surfaces artifacts on the product page. Both follow-ups are advisory.

use crate::checksums;
use crate::remote::{self, BasicAuth};
use crate::DistArtifacts;
use reqwest::Client;
use slipway_errors::Result;
use slipway_events::{AppEvent, EventEmitter, EventSender, PublishEvent};
use slipway_types::ProductSpec;
use std::path::Path;

/// Bintray-style remote, addressed by subject and repository
#[derive(Debug, Clone)]
pub struct BintrayDestination {
    /// Base URL, e.g. `https://api.bintray.com`
    pub url: String,
    /// Owning subject (user or organization)
    pub subject: String,
    pub repository: String,
    pub username: String,
    pub password: String,
    /// Release uploaded content after the upload completes
    pub publish: bool,
    /// Add uploaded artifacts to the product's downloads list
    pub downloads_list: bool,
}

impl BintrayDestination {
    /// Upload every artifact and the POM, then run the configured
    /// follow-ups
    pub(crate) async fn publish(
        &self,
        client: &Client,
        spec: &ProductSpec,
        artifacts: &DistArtifacts,
        tx: &EventSender,
    ) -> Result<Vec<String>> {
        let auth = BasicAuth {
            username: self.username.clone(),
            password: self.password.clone(),
        };
        let mut urls = Vec::with_capacity(artifacts.artifacts.len());
        let mut names = Vec::with_capacity(artifacts.artifacts.len());
        for file in &artifacts.artifacts {
            let name = crate::file_name(file)?;
            urls.push(
                self.upload(client, &auth, spec, &artifacts.remote_dir, file, &name, tx)
                    .await?,
            );
            names.push(name);
        }
        let pom_name = crate::file_name(&artifacts.pom)?;
        self.upload(
            client,
            &auth,
            spec,
            &artifacts.remote_dir,
            &artifacts.pom,
            &pom_name,
            tx,
        )
        .await?;

        if self.publish {
            if let Err(err) = self.release_content(client, &auth, spec).await {
                tx.emit(AppEvent::Publish(PublishEvent::FollowUpFailed {
                    action: format!("publish of {} {}", spec.name, spec.version),
                    error: err.to_string(),
                }));
            }
        }
        if self.downloads_list {
            for name in &names {
                if let Err(err) = self
                    .add_to_downloads_list(client, &auth, spec, &artifacts.remote_dir, name)
                    .await
                {
                    tx.emit(AppEvent::Publish(PublishEvent::FollowUpFailed {
                        action: format!("downloads list entry for {name}"),
                        error: err.to_string(),
                    }));
                }
            }
        }
        Ok(urls)
    }

    /// Final content URL a file lands under
    pub(crate) fn content_url(&self, spec: &ProductSpec, remote_dir: &str, name: &str) -> String {
        format!(
            "{}/content/{}/{}/{}/{}/{remote_dir}/{name}",
            self.base(),
            self.subject,
            self.repository,
            spec.name,
            spec.version
        )
    }

    #[allow(clippy::too_many_arguments)]
    async fn upload(
        &self,
        client: &Client,
        auth: &BasicAuth,
        spec: &ProductSpec,
        remote_dir: &str,
        file: &Path,
        name: &str,
        tx: &EventSender,
    ) -> Result<String> {
        let url = self.content_url(spec, remote_dir, name);
        let sums = checksums::compute(file).await?;
        tx.emit(AppEvent::Publish(PublishEvent::UploadStarted {
            file: name.to_string(),
            url: url.clone(),
        }));
        remote::put_file(client, &url, auth, file, &sums).await?;
        Ok(url)
    }

    async fn release_content(
        &self,
        client: &Client,
        auth: &BasicAuth,
        spec: &ProductSpec,
    ) -> Result<()> {
        let url = format!(
            "{}/content/{}/{}/{}/{}/publish",
            self.base(),
            self.subject,
            self.repository,
            spec.name,
            spec.version
        );
        let body = serde_json::json!({ "publish_wait_for_secs": -1 });
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

    async fn add_to_downloads_list(
        &self,
        client: &Client,
        auth: &BasicAuth,
        spec: &ProductSpec,
        remote_dir: &str,
        name: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/file_metadata/{}/{}/{}/{}/{remote_dir}/{name}",
            self.base(),
            self.subject,
            self.repository,
            spec.name,
            spec.version
        );
        let body = serde_json::json!({ "list_in_downloads": true });
        let response = client
            .put(&url)
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
