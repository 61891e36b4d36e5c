//! Almanac registration sidecar
//!
//! After an artifact lands in a repository, its URL can be registered
//! with an almanac service as a product/branch/revision-keyed unit.
//! Product and branch are created on first use; units are written once.
//! Every request is signed with HMAC-SHA1 over the URL, a unix
//! timestamp, and the body.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha1::Sha1;
use slipway_errors::{Error, PublishError, Result};
use slipway_events::{AppEvent, EventEmitter, EventSender, PublishEvent};
use slipway_types::{DistConfig, ProductSpec};

type HmacSha1 = Hmac<Sha1>;

/// Connection and behavior settings for the almanac service
#[derive(Debug, Clone)]
pub struct AlmanacConfig {
    /// Base URL of the almanac service
    pub url: String,
    /// Access ID the requests are signed as
    pub access_id: String,
    /// Preshared signing secret
    pub secret: String,
    /// Release the unit to GA after registration
    pub release: bool,
}

/// Outcome of probing for an existing unit
enum UnitProbe {
    Absent,
    Matches,
    Conflict(String),
}

/// Register one uploaded artifact URL as a unit
pub(crate) async fn register(
    client: &Client,
    config: &AlmanacConfig,
    spec: &ProductSpec,
    dist_cfg: &DistConfig,
    artifact_url: &str,
    tx: &EventSender,
) -> Result<()> {
    let product = &spec.name;
    let branch = &spec.version_info.branch;
    let revision = &spec.version_info.revision;
    let base = config.url.trim_end_matches('/');

    let product_url = format!("{base}/v1/products/{product}");
    if !exists(client, config, &product_url).await {
        let url = format!("{base}/v1/products");
        create(client, config, &url, &serde_json::json!({ "name": product })).await?;
    }

    let branch_url = format!("{base}/v1/products/{product}/branches/{branch}");
    if !exists(client, config, &branch_url).await {
        let url = format!("{base}/v1/products/{product}/branches");
        create(client, config, &url, &serde_json::json!({ "name": branch })).await?;
    }

    let unit_url = format!("{base}/v1/units/{product}/{branch}/{revision}");
    match probe_unit(client, config, &unit_url, artifact_url).await {
        UnitProbe::Matches => {
            tx.emit_debug(format!(
                "almanac unit for {product}/{branch}/{revision} already published, skipping"
            ));
            return Ok(());
        }
        UnitProbe::Conflict(existing) => {
            return Err(PublishError::AlmanacUrlConflict {
                product: product.clone(),
                branch: branch.clone(),
                revision: revision.clone(),
                existing,
            }
            .into());
        }
        UnitProbe::Absent => {}
    }

    let create_url = format!("{base}/v1/units");
    let body = serde_json::json!({
        "product": product,
        "branch": branch,
        "revision": revision,
        "url": artifact_url,
        "metadata": dist_cfg.publish.almanac.metadata,
        "tags": dist_cfg.publish.almanac.tags,
    });
    create(client, config, &create_url, &body).await?;

    if config.release {
        let release_url = format!("{unit_url}/releases");
        create(client, config, &release_url, &serde_json::json!({ "name": "GA" })).await?;
    }

    tx.emit(AppEvent::Publish(PublishEvent::AlmanacRegistered {
        product: product.clone(),
        version: spec.version.clone(),
    }));
    Ok(())
}

/// Check for an existing unit and compare its registered URL
///
/// Any probe failure reads as absent; a readable unit with a differing
/// or missing `url` field is a conflict.
async fn probe_unit(
    client: &Client,
    config: &AlmanacConfig,
    unit_url: &str,
    artifact_url: &str,
) -> UnitProbe {
    let Ok(response) = signed_get(client, config, unit_url).await else {
        return UnitProbe::Absent;
    };
    if !response.status().is_success() {
        return UnitProbe::Absent;
    }
    let Ok(text) = response.text().await else {
        return UnitProbe::Absent;
    };
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => match value.get("url").and_then(serde_json::Value::as_str) {
            Some(url) if url == artifact_url => UnitProbe::Matches,
            Some(url) => UnitProbe::Conflict(url.to_string()),
            None => UnitProbe::Conflict(value.to_string()),
        },
        Err(_) => UnitProbe::Conflict(text.trim().to_string()),
    }
}

async fn exists(client: &Client, config: &AlmanacConfig, url: &str) -> bool {
    match signed_get(client, config, url).await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

async fn signed_get(client: &Client, config: &AlmanacConfig, url: &str) -> Result<reqwest::Response> {
    let (timestamp, authorization) = sign(config, url, "");
    client
        .get(url)
        .header("X-timestamp", timestamp.to_string())
        .header("X-authorization", authorization)
        .send()
        .await
        .map_err(|e| almanac_failed(url, &e.to_string()))
}

async fn create(
    client: &Client,
    config: &AlmanacConfig,
    url: &str,
    body: &serde_json::Value,
) -> Result<()> {
    let text = body.to_string();
    let (timestamp, authorization) = sign(config, url, &text);
    tracing::debug!(url, "almanac create");
    let response = client
        .post(url)
        .header("X-timestamp", timestamp.to_string())
        .header("X-authorization", authorization)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(text)
        .send()
        .await
        .map_err(|e| almanac_failed(url, &e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{status}: {}", body.trim())
        };
        return Err(almanac_failed(url, &detail));
    }
    Ok(())
}

fn almanac_failed(url: &str, message: &str) -> Error {
    PublishError::AlmanacFailed {
        message: format!("{url}: {message}"),
    }
    .into()
}

/// Produce the timestamp and `X-authorization` value for one request
fn sign(config: &AlmanacConfig, url: &str, body: &str) -> (u64, String) {
    let timestamp = unix_timestamp();
    let digest = signature(&config.secret, url, timestamp, body);
    (timestamp, format!("{}:{digest}", config.access_id))
}

/// HMAC-SHA1 over `<url><timestamp><body>`, base64-encoded
fn signature(secret: &str, url: &str, timestamp: u64, body: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(format!("{url}{timestamp}{body}").as_bytes());
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        let a = signature("secret", "http://a/v1/products", 1_500_000_000, "{}");
        let b = signature("secret", "http://a/v1/products", 1_500_000_000, "{}");
        assert_eq!(a, b);
    }

    #[test]
    fn signature_covers_url_timestamp_and_body() {
        let base = signature("secret", "http://a/v1/products", 1_500_000_000, "{}");
        assert_ne!(
            base,
            signature("secret", "http://a/v1/units", 1_500_000_000, "{}")
        );
        assert_ne!(
            base,
            signature("secret", "http://a/v1/products", 1_500_000_001, "{}")
        );
        assert_ne!(
            base,
            signature("secret", "http://a/v1/products", 1_500_000_000, "{\"name\":\"x\"}")
        );
        assert_ne!(
            base,
            signature("other", "http://a/v1/products", 1_500_000_000, "{}")
        );
    }

    #[test]
    fn signature_is_base64_of_a_sha1_digest() {
        let sig = signature("secret", "http://a", 1, "");
        let bytes = general_purpose::STANDARD.decode(sig).unwrap();
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn authorization_header_carries_access_id() {
        let config = AlmanacConfig {
            url: "http://a".to_string(),
            access_id: "tester".to_string(),
            secret: "secret".to_string(),
            release: false,
        };
        let (_, authorization) = sign(&config, "http://a/v1/products", "{}");
        assert!(authorization.starts_with("tester:"));
    }
}
