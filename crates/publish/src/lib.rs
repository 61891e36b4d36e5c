#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Publishing of dist artifacts
//!
//! Pushes the artifacts the dist engine produced to a configured sink:
//! a local Maven-style tree, an Artifactory-style remote, a Bintray-style
//! remote, or a release host. A POM descriptor is generated per dist and
//! published with the artifacts; uploaded repository URLs can optionally
//! be registered with an almanac service. Missing dist artifacts are
//! built on demand before anything is uploaded.

pub mod almanac;
pub mod checksums;
pub mod pom;

mod artifactory;
mod bintray;
mod github;
mod local;
mod remote;

pub use almanac::AlmanacConfig;
pub use artifactory::ArtifactoryDestination;
pub use bintray::BintrayDestination;
pub use github::GitHubDestination;
pub use local::LocalDestination;

use reqwest::Client;
use slipway_builder::{build, freshness, BuildOptions};
use slipway_dist::effective_dist_type;
use slipway_errors::{Error, PublishError, Result};
use slipway_events::{AppEvent, BuildEvent, EventEmitter, EventSender, PublishEvent};
use slipway_types::{paths, DistConfig, ProductSpec, SpecWithDeps};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where artifacts are published to
#[derive(Debug, Clone)]
pub enum Destination {
    Local(LocalDestination),
    Artifactory(ArtifactoryDestination),
    Bintray(BintrayDestination),
    GitHub(GitHubDestination),
}

/// Publish behavior settings
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Abort on the first product error instead of aggregating
    pub fail_fast: bool,
    /// Report planned uploads without contacting any remote
    pub dry_run: bool,
    /// Register uploaded artifact URLs with an almanac service
    pub almanac: Option<AlmanacConfig>,
}

/// Everything one dist contributes to a publish
#[derive(Debug)]
pub(crate) struct DistArtifacts {
    /// POM written next to the artifacts
    pom: PathBuf,
    /// Final artifact paths, in configuration order
    artifacts: Vec<PathBuf>,
    /// Remote directory: `<group-path>/<product>/<version>`
    remote_dir: String,
}

/// Publish every dist of every product to `destination`
///
/// Products are processed in list order. With `fail_fast` the first
/// error aborts; otherwise per-product errors are collected into one
/// batch error and every remaining product is still attempted.
///
/// # Errors
///
/// Returns the first error (fail-fast) or the aggregated batch error.
pub async fn publish_products(
    specs: &[SpecWithDeps],
    destination: &Destination,
    opts: &PublishOptions,
    tx: &EventSender,
) -> Result<()> {
    // One client for the whole publish; requests are never retried
    let client = Client::new();
    if opts.fail_fast {
        for with_deps in specs {
            publish_product(&client, with_deps, destination, opts, tx).await?;
        }
        return Ok(());
    }

    let mut messages = Vec::new();
    for with_deps in specs {
        if let Err(err) = publish_product(&client, with_deps, destination, opts, tx).await {
            messages.push(format!("{}: {err}", with_deps.spec.name));
        }
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(PublishError::Batch { messages }.into())
    }
}

async fn publish_product(
    client: &Client,
    with_deps: &SpecWithDeps,
    destination: &Destination,
    opts: &PublishOptions,
    tx: &EventSender,
) -> Result<()> {
    if opts.dry_run {
        warn_missing_artifacts(&with_deps.spec, tx);
    } else {
        ensure_dist_artifacts(with_deps, tx).await?;
    }
    for dist_cfg in &with_deps.spec.config.dist {
        publish_dist(client, &with_deps.spec, dist_cfg, destination, opts, tx).await?;
    }
    Ok(())
}

async fn publish_dist(
    client: &Client,
    spec: &ProductSpec,
    dist_cfg: &DistConfig,
    destination: &Destination,
    opts: &PublishOptions,
    tx: &EventSender,
) -> Result<()> {
    let artifacts = prepare(spec, dist_cfg).await?;

    if opts.dry_run {
        for file in planned_files(destination, &artifacts) {
            let name = file_name(file)?;
            let url = planned_url(destination, spec, &artifacts, &name);
            tx.emit(AppEvent::Publish(PublishEvent::UploadPlanned { file: name, url }));
        }
        return Ok(());
    }

    let urls = match destination {
        Destination::Local(dest) => dest.publish(&artifacts, tx).await?,
        Destination::Artifactory(dest) => dest.publish(client, &artifacts, tx).await?,
        Destination::Bintray(dest) => dest.publish(client, spec, &artifacts, tx).await?,
        Destination::GitHub(dest) => dest.publish(client, spec, &artifacts, tx).await?,
    };

    if let Some(almanac_config) = &opts.almanac {
        for url in &urls {
            almanac::register(client, almanac_config, spec, dist_cfg, url, tx).await?;
        }
    }
    Ok(())
}

/// Write the POM and collect what one dist contributes to a publish
async fn prepare(spec: &ProductSpec, dist_cfg: &DistConfig) -> Result<DistArtifacts> {
    let group_id = &dist_cfg.publish.group_id;
    if group_id.is_empty() {
        return Err(PublishError::GroupIdRequired {
            product: spec.name.clone(),
        }
        .into());
    }

    let packaging = effective_dist_type(spec, dist_cfg).artifact_extension();
    let pom_text = pom::render(group_id, &spec.name, &spec.version, &packaging);
    let out_dir = paths::dist_output_dir(spec, dist_cfg);
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| Error::io_with_path(&e, &out_dir))?;
    let pom_path = out_dir.join(pom::file_name(&spec.name, &spec.version));
    tokio::fs::write(&pom_path, pom_text)
        .await
        .map_err(|e| Error::io_with_path(&e, &pom_path))?;

    let remote_dir = format!(
        "{}/{}/{}",
        group_id.replace('.', "/"),
        spec.name,
        spec.version
    );
    Ok(DistArtifacts {
        pom: pom_path,
        artifacts: paths::dist_artifact_paths(spec, dist_cfg),
        remote_dir,
    })
}

/// Make sure every dist artifact of the product exists, running the
/// prerequisite build and dist steps when one is missing
async fn ensure_dist_artifacts(with_deps: &SpecWithDeps, tx: &EventSender) -> Result<()> {
    let spec = &with_deps.spec;
    let missing: Vec<PathBuf> = spec
        .config
        .dist
        .iter()
        .flat_map(|dist_cfg| paths::dist_artifact_paths(spec, dist_cfg))
        .filter(|path| !path.exists())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    for path in &missing {
        tx.emit_debug(format!(
            "{} does not exist, running dist for {} first",
            path.display(),
            spec.name
        ));
    }

    let oracle = freshness::check(std::slice::from_ref(with_deps), &[]);
    for unit in oracle.units() {
        if unit.reason.is_none() {
            tx.emit(AppEvent::Build(BuildEvent::UpToDate {
                product: unit.product.clone(),
                os_arch: unit.os_arch.clone(),
            }));
        }
    }
    let mut stale_products: Vec<String> = oracle
        .stale_units()
        .map(|unit| unit.product.clone())
        .collect();
    // Units are grouped per product in examination order
    stale_products.dedup();
    for product in &stale_products {
        let targets = oracle.stale_targets(product);
        let entry = if *product == spec.name {
            with_deps.clone()
        } else if let Some(dep) = with_deps.dep(product) {
            // Input products build standalone; their own inputs are not
            // needed for a build
            SpecWithDeps {
                spec: dep.clone(),
                deps: BTreeMap::new(),
            }
        } else {
            continue;
        };
        build(
            std::slice::from_ref(&entry),
            &targets,
            &BuildOptions::default(),
            tx,
        )
        .await?;
    }
    slipway_dist::dist_product(with_deps, tx).await
}

/// Dry run never builds; absent artifacts are only warned about
fn warn_missing_artifacts(spec: &ProductSpec, tx: &EventSender) {
    for dist_cfg in &spec.config.dist {
        for path in paths::dist_artifact_paths(spec, dist_cfg) {
            if !path.exists() {
                tx.emit_warning(format!(
                    "artifact {} does not exist and would be built",
                    path.display()
                ));
            }
        }
    }
}

/// Files a destination would receive; release hosts take no POM
fn planned_files<'a>(destination: &Destination, artifacts: &'a DistArtifacts) -> Vec<&'a PathBuf> {
    match destination {
        Destination::GitHub(_) => artifacts.artifacts.iter().collect(),
        _ => artifacts.artifacts.iter().chain([&artifacts.pom]).collect(),
    }
}

fn planned_url(
    destination: &Destination,
    spec: &ProductSpec,
    artifacts: &DistArtifacts,
    name: &str,
) -> String {
    match destination {
        Destination::Local(dest) => dest
            .path
            .join(&artifacts.remote_dir)
            .join(name)
            .display()
            .to_string(),
        Destination::Artifactory(dest) => dest.file_url(&artifacts.remote_dir, name),
        Destination::Bintray(dest) => dest.content_url(spec, &artifacts.remote_dir, name),
        Destination::GitHub(_) => format!("release {} asset {name}", spec.version),
    }
}

/// Final path component as a string
pub(crate) fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::internal(format!("no file name in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{ProductConfig, PublishConfig, VersionInfo};

    fn spec(dir: &Path, group_id: &str) -> ProductSpec {
        let config = ProductConfig {
            dist: vec![DistConfig {
                publish: PublishConfig {
                    group_id: group_id.to_string(),
                    ..PublishConfig::default()
                },
                ..DistConfig::default()
            }],
            ..ProductConfig::default()
        };
        ProductSpec {
            project_dir: dir.to_path_buf(),
            name: "widget".to_string(),
            version: "1.2.0".to_string(),
            version_info: VersionInfo::new("1.2.0", "v1.2.0", "0"),
            config,
        }
    }

    #[tokio::test]
    async fn prepare_writes_pom_and_remote_dir() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec(dir.path(), "com.acme.tools");
        let dist_cfg = spec.config.dist[0].clone();

        let artifacts = prepare(&spec, &dist_cfg).await.unwrap();
        assert_eq!(artifacts.remote_dir, "com/acme/tools/widget/1.2.0");
        let pom = std::fs::read_to_string(&artifacts.pom).unwrap();
        assert!(pom.contains("<artifactId>widget</artifactId>"));
        assert!(artifacts
            .pom
            .to_string_lossy()
            .ends_with("widget-1.2.0.pom"));
    }

    #[tokio::test]
    async fn prepare_requires_a_group_id() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec(dir.path(), "");
        let dist_cfg = spec.config.dist[0].clone();

        let err = prepare(&spec, &dist_cfg).await;
        assert!(matches!(
            err,
            Err(Error::Publish(PublishError::GroupIdRequired { .. }))
        ));
    }

    #[test]
    fn batch_error_joins_messages_with_newlines() {
        let err = PublishError::Batch {
            messages: vec!["widget: first".to_string(), "gadget: second".to_string()],
        };
        assert_eq!(err.to_string(), "widget: first\ngadget: second");
    }
}
