#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Distribution assembly
//!
//! Turns built binaries into distributable artifacts. Each product may
//! carry several distributions; every one runs the same sequence:
//! recreate the staging tree, copy static input files, lay out the
//! variant, run the user's dist script, and package the result. Container
//! images build on top of finished dists and are scheduled separately.

pub mod archive;
pub mod docker;
pub mod scheduler;

mod bin;
mod manual;
mod osarchbin;
mod rpm;
mod sls;
mod staging;
mod template;

pub use docker::{build_images, push_images, DockerOptions};

use slipway_builder::script;
use slipway_errors::{DistError, Error, Result};
use slipway_events::{AppEvent, DistEvent, EventEmitter, EventSender};
use slipway_types::{
    paths, DistConfig, DistType, OsArchsBinDistInfo, ProductSpec, SpecWithDeps,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Assemble every distribution of every product, in order
///
/// # Errors
///
/// Returns the first error; later products are not attempted.
pub async fn dist_all(specs: &[SpecWithDeps], tx: &EventSender) -> Result<()> {
    for with_deps in specs {
        dist_product(with_deps, tx).await?;
    }
    Ok(())
}

/// Assemble every distribution of one product
///
/// # Errors
///
/// Returns an error if a required build artifact is missing or any dist
/// fails to assemble.
pub async fn dist_product(with_deps: &SpecWithDeps, tx: &EventSender) -> Result<()> {
    verify_build_artifacts(with_deps)?;
    for dist_cfg in &with_deps.spec.config.dist {
        create_dist(with_deps, dist_cfg, tx).await?;
    }
    Ok(())
}

async fn create_dist(
    with_deps: &SpecWithDeps,
    dist_cfg: &DistConfig,
    tx: &EventSender,
) -> Result<()> {
    let spec = &with_deps.spec;
    let dist_type = effective_dist_type(spec, dist_cfg);
    tx.emit(AppEvent::Dist(DistEvent::Started {
        product: spec.name.clone(),
        dist_type: dist_type.name().to_string(),
    }));

    if matches!(dist_type, DistType::Rpm(_)) {
        rpm::check_preflight()?;
        rpm::validate_targets(spec)?;
    }

    let staging_root = paths::dist_work_dir(spec, dist_cfg);
    staging::recreate(&staging_root)?;

    if !dist_cfg.input_dir.is_empty() {
        let input = spec.project_dir.join(&dist_cfg.input_dir);
        staging::copy_contents(&input, &staging_root)?;
    }

    match &dist_type {
        DistType::Sls(info) => sls::layout(with_deps, dist_cfg, info, &staging_root)?,
        DistType::Bin(info) => bin::layout(with_deps, dist_cfg, info, &staging_root)?,
        DistType::OsArchsBin(info) => osarchbin::layout(with_deps, dist_cfg, info, &staging_root)?,
        DistType::Rpm(_) | DistType::Manual(_) => {}
    }

    if !dist_cfg.script.is_empty() {
        let env = dist_script_env(spec, &staging_root);
        script::run_script(&spec.project_dir, &dist_cfg.script, &env, tx).await?;
    }

    for path in package(spec, dist_cfg, &dist_type, &staging_root, tx).await? {
        tx.emit(AppEvent::Dist(DistEvent::ArtifactCreated {
            product: spec.name.clone(),
            path,
        }));
    }
    Ok(())
}

/// Produce the final artifacts for one dist and return their paths
async fn package(
    spec: &ProductSpec,
    dist_cfg: &DistConfig,
    dist_type: &DistType,
    staging_root: &Path,
    tx: &EventSender,
) -> Result<Vec<PathBuf>> {
    let out_dir = paths::dist_output_dir(spec, dist_cfg);
    std::fs::create_dir_all(&out_dir).map_err(|e| Error::io_with_path(&e, &out_dir))?;
    let artifacts = paths::dist_artifact_paths(spec, dist_cfg);

    match dist_type {
        DistType::Sls(_) | DistType::Bin(_) => {
            let dest = single_artifact(spec, &artifacts)?;
            let entry = format!("{}-{}", spec.name, spec.version);
            archive::create_tgz(staging_root, &entry, dest).await?;
        }
        DistType::OsArchsBin(info) => {
            for (os_arch, dest) in paths::os_archs_bin_targets(spec, info).iter().zip(&artifacts) {
                let src = staging_root.join(os_arch.to_string());
                let entry = format!("{}-{}-{os_arch}", spec.name, spec.version);
                archive::create_tgz(&src, &entry, dest).await?;
            }
        }
        DistType::Rpm(info) => {
            let dest = single_artifact(spec, &artifacts)?;
            rpm::package(spec, info, staging_root, dest, tx).await?;
        }
        DistType::Manual(_) => {
            let dest = single_artifact(spec, &artifacts)?;
            manual::package(spec, staging_root, dest)?;
        }
    }
    Ok(artifacts)
}

fn single_artifact<'a>(spec: &ProductSpec, artifacts: &'a [PathBuf]) -> Result<&'a PathBuf> {
    artifacts.first().ok_or_else(|| {
        Error::internal(format!("dist for {} produces no artifacts", spec.name))
    })
}

/// Every product a dist consumes must have been built first
fn verify_build_artifacts(with_deps: &SpecWithDeps) -> Result<()> {
    let mut missing = BTreeSet::new();
    check_artifacts(&with_deps.spec, &mut missing);
    for dep in with_deps.deps.values() {
        check_artifacts(dep, &mut missing);
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DistError::MissingBuildArtifacts {
            missing: missing.into_iter().collect(),
        }
        .into())
    }
}

fn check_artifacts(spec: &ProductSpec, missing: &mut BTreeSet<String>) {
    if spec.config.build.skip {
        return;
    }
    for artifact in paths::build_artifacts(spec, &[]).values() {
        if !artifact.is_file() {
            missing.insert(spec.name.clone());
        }
    }
}

/// Specs of the input products one dist consumes, in configuration order
pub(crate) fn dist_deps<'a>(
    with_deps: &'a SpecWithDeps,
    dist_cfg: &DistConfig,
) -> Result<Vec<&'a ProductSpec>> {
    dist_cfg
        .input_products
        .iter()
        .map(|name| {
            with_deps.dep(name).ok_or_else(|| {
                Error::internal(format!(
                    "input product {name} missing from resolved dependencies of {}",
                    with_deps.spec.name
                ))
            })
        })
        .collect()
}

/// The dist's variant; an absent type is the implicit os-archs-bin dist
/// over the product's build targets
#[must_use]
pub fn effective_dist_type(spec: &ProductSpec, dist_cfg: &DistConfig) -> DistType {
    dist_cfg.dist_type.clone().unwrap_or_else(|| {
        DistType::OsArchsBin(OsArchsBinDistInfo {
            os_archs: spec.config.build.os_archs.clone(),
        })
    })
}

/// Environment for the per-dist script; the well-known variables override
/// user-declared build environment entries of the same name
fn dist_script_env(spec: &ProductSpec, staging_root: &Path) -> BTreeMap<String, String> {
    let mut env = spec.config.build.environment.clone();
    let dist_dir = staging_root
        .canonicalize()
        .unwrap_or_else(|_| staging_root.to_path_buf());
    env.insert("DIST_DIR".to_string(), dist_dir.display().to_string());
    env.insert(
        "PROJECT_DIR".to_string(),
        spec.project_dir.display().to_string(),
    );
    env.insert("PRODUCT".to_string(), spec.name.clone());
    env.insert("VERSION".to_string(), spec.version.clone());
    env.insert(
        "IS_SNAPSHOT".to_string(),
        if spec.version_info.is_snapshot() { "1" } else { "0" }.to_string(),
    );
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{OsArch, ProductConfig, VersionInfo};

    fn spec_in(project_dir: &Path) -> ProductSpec {
        let mut config = ProductConfig::default();
        config.build.os_archs = vec![OsArch::new("linux", "amd64")];
        ProductSpec {
            project_dir: project_dir.to_path_buf(),
            name: "foo".to_string(),
            version: "1.0.0".to_string(),
            version_info: VersionInfo::new("1.0.0", "1.0.0", "0"),
            config,
        }
    }

    #[test]
    fn missing_artifacts_name_the_product() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_in(dir.path());
        let with_deps = SpecWithDeps::new(spec, &BTreeMap::new()).unwrap();
        let err = verify_build_artifacts(&with_deps).unwrap_err();
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn skipped_products_need_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = spec_in(dir.path());
        spec.config.build.skip = true;
        let with_deps = SpecWithDeps::new(spec, &BTreeMap::new()).unwrap();
        verify_build_artifacts(&with_deps).unwrap();
    }

    #[test]
    fn script_env_carries_the_documented_variables() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = spec_in(dir.path());
        spec.version = "1.0.0-4-gaaaaaaa".to_string();
        spec.version_info = VersionInfo::new("1.0.0-4-gaaaaaaa", "1.0.0", "4");
        spec.config
            .build
            .environment
            .insert("CUSTOM".to_string(), "yes".to_string());

        let staging = dir.path().join("dist/foo-1.0.0");
        std::fs::create_dir_all(&staging).unwrap();
        let env = dist_script_env(&spec, &staging);
        assert_eq!(env.get("PRODUCT").map(String::as_str), Some("foo"));
        assert_eq!(env.get("IS_SNAPSHOT").map(String::as_str), Some("1"));
        assert_eq!(env.get("CUSTOM").map(String::as_str), Some("yes"));
        assert!(env.get("DIST_DIR").is_some_and(|dir| PathBuf::from(dir).is_absolute()));
    }

    #[test]
    fn untyped_dists_default_to_per_target_archives() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_in(dir.path());
        match effective_dist_type(&spec, &DistConfig::default()) {
            DistType::OsArchsBin(info) => {
                assert_eq!(info.os_archs, spec.config.build.os_archs);
            }
            other => panic!("unexpected dist type: {other:?}"),
        }
    }
}
