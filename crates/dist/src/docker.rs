//! Container image builds and pushes
//!
//! Images build in the order decided by the scheduler. Before `docker
//! build` runs, every dist-kind dependency is copied into the build
//! context, and service-layout images gain their manifest and
//! configuration labels.

use crate::{scheduler, sls, staging};
use base64::{engine::general_purpose, Engine as _};
use slipway_builder::script;
use slipway_errors::{DistError, Error, Result};
use slipway_events::{AppEvent, DistEvent, EventEmitter, EventSender};
use slipway_types::{
    paths, DistConfig, DistType, DockerDepKind, DockerImageConfig, DockerImageInfo, ProductSpec,
    SpecWithDeps,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

const MANIFEST_LABEL: &str = "com.palantir.sls.manifest";
const CONFIGURATION_LABEL: &str = "com.palantir.sls.configuration";

/// Options for the image build and push operations
#[derive(Debug, Clone, Default)]
pub struct DockerOptions {
    /// Prefix joined in front of every image repository
    pub base_repository: String,
    /// Stream builder output instead of capturing it
    pub verbose: bool,
}

/// Build the images of the requested products
///
/// First runs the dist phase for every product whose dist artifacts the
/// images consume, then builds images in dependency order.
///
/// # Errors
///
/// Returns an error when the dependency graph has a cycle, a required
/// artifact is missing, or `docker build` fails.
pub async fn build_images(
    all: &BTreeMap<String, SpecWithDeps>,
    requested: &[String],
    opts: &DockerOptions,
    tx: &EventSender,
) -> Result<()> {
    let plan = scheduler::plan(all, requested)?;
    for name in &plan.dist_products {
        if let Some(with_deps) = all.get(name) {
            crate::dist_product(with_deps, tx).await?;
        }
    }
    for name in &plan.image_order {
        let Some(with_deps) = all.get(name) else {
            continue;
        };
        for image in &with_deps.spec.config.docker {
            build_image(all, &with_deps.spec, image, opts, tx).await?;
        }
    }
    Ok(())
}

/// Push every image of the requested products with `docker push`
///
/// # Errors
///
/// Returns an error when `docker push` fails for any image.
pub async fn push_images(
    all: &BTreeMap<String, SpecWithDeps>,
    requested: &[String],
    opts: &DockerOptions,
    tx: &EventSender,
) -> Result<()> {
    for name in requested {
        let Some(with_deps) = all.get(name) else {
            continue;
        };
        let spec = &with_deps.spec;
        for image in &spec.config.docker {
            let name = image_name(spec, image, &opts.base_repository);
            tx.emit(AppEvent::Dist(DistEvent::DockerPushStarted {
                product: spec.name.clone(),
                image: name.clone(),
            }));
            let args = vec!["push".to_string(), name.clone()];
            run_docker(&args, &spec.project_dir, opts.verbose).await?;
            tx.emit(AppEvent::Dist(DistEvent::DockerPushCompleted {
                product: spec.name.clone(),
                image: name,
            }));
        }
    }
    Ok(())
}

async fn build_image(
    all: &BTreeMap<String, SpecWithDeps>,
    spec: &ProductSpec,
    image: &DockerImageConfig,
    opts: &DockerOptions,
    tx: &EventSender,
) -> Result<()> {
    let context_dir = spec.project_dir.join(&image.context_dir);
    place_dependencies(all, spec, image, &context_dir)?;

    let name = image_name(spec, image, &opts.base_repository);
    let mut args: Vec<String> = vec!["build".to_string(), "--tag".to_string(), name.clone()];
    for (key, value) in labels(spec, image, &context_dir)? {
        args.push("--label".to_string());
        args.push(format!("{key}={value}"));
    }
    args.extend(script_build_args(spec, image, tx).await?);
    args.push(context_dir.display().to_string());

    tx.emit(AppEvent::Dist(DistEvent::DockerBuildStarted {
        product: spec.name.clone(),
        image: name.clone(),
    }));
    run_docker(&args, &spec.project_dir, opts.verbose).await?;
    tx.emit(AppEvent::Dist(DistEvent::DockerBuildCompleted {
        product: spec.name.clone(),
        image: name,
    }));
    Ok(())
}

fn image_name(spec: &ProductSpec, image: &DockerImageConfig, base_repository: &str) -> String {
    let repository = paths::docker_repository(spec, image);
    let repository = if base_repository.is_empty() {
        repository
    } else {
        format!("{}/{repository}", base_repository.trim_end_matches('/'))
    };
    format!("{repository}:{}", paths::docker_tag(spec, image))
}

/// Copy each dist-kind dependency's artifact into the build context
///
/// Dependencies of the image kind only order builds and are skipped here.
fn place_dependencies(
    all: &BTreeMap<String, SpecWithDeps>,
    spec: &ProductSpec,
    image: &DockerImageConfig,
    context_dir: &Path,
) -> Result<()> {
    for dep in &image.dependencies {
        if dep.kind == DockerDepKind::Docker {
            continue;
        }
        let dep_spec = all
            .get(&dep.product)
            .map(|with_deps| &with_deps.spec)
            .ok_or_else(|| {
                Error::internal(format!(
                    "image dependency {} is not a known product",
                    dep.product
                ))
            })?;
        let dist_cfg =
            dist_of_kind(dep_spec, dep.kind).ok_or_else(|| DistError::NoDistOfKind {
                product: spec.name.clone(),
                dependency: dep.product.clone(),
                kind: dep.kind.to_string(),
            })?;
        let artifact = paths::dist_artifact_paths(dep_spec, dist_cfg)
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::internal(format!("dist for {} produces no artifacts", dep.product))
            })?;
        if !artifact.is_file() {
            return Err(DistError::DependencyArtifactMissing {
                product: spec.name.clone(),
                dependency: dep.product.clone(),
                kind: dep.kind.to_string(),
                path: artifact.display().to_string(),
            }
            .into());
        }
        let target = if dep.target_file.is_empty() {
            artifact.file_name().map_or_else(
                || dep.product.clone(),
                |file| file.to_string_lossy().into_owned(),
            )
        } else {
            dep.target_file.clone()
        };
        staging::copy_file(&artifact, &context_dir.join(target))?;
    }
    Ok(())
}

/// The first dist of a product whose type matches the dependency kind
fn dist_of_kind(spec: &ProductSpec, kind: DockerDepKind) -> Option<&DistConfig> {
    spec.config.dist.iter().find(|dist| {
        matches!(
            (&dist.dist_type, kind),
            (Some(DistType::Sls(_)), DockerDepKind::Sls)
                | (Some(DistType::Bin(_)), DockerDepKind::Bin)
                | (Some(DistType::Rpm(_)), DockerDepKind::Rpm)
        )
    })
}

/// Service-layout images carry their rendered manifest and, when present,
/// the context's `configuration.yml` as base64-encoded labels
fn labels(
    spec: &ProductSpec,
    image: &DockerImageConfig,
    context_dir: &Path,
) -> Result<Vec<(String, String)>> {
    let Some(DockerImageInfo::Sls(info)) = &image.info else {
        return Ok(Vec::new());
    };
    let manifest = sls::manifest_text(
        &info.group_id,
        &spec.name,
        &spec.version,
        &info.product_type,
        &info.manifest_extensions,
    )?;
    let mut labels = vec![(
        MANIFEST_LABEL.to_string(),
        general_purpose::STANDARD.encode(manifest),
    )];
    let configuration = context_dir.join("configuration.yml");
    if configuration.is_file() {
        let contents =
            std::fs::read(&configuration).map_err(|e| Error::io_with_path(&e, &configuration))?;
        labels.push((
            CONFIGURATION_LABEL.to_string(),
            general_purpose::STANDARD.encode(contents),
        ));
    }
    Ok(labels)
}

/// Build-argument script stdout lines, one argument per non-empty line
async fn script_build_args(
    spec: &ProductSpec,
    image: &DockerImageConfig,
    tx: &EventSender,
) -> Result<Vec<String>> {
    if image.build_args_script.is_empty() {
        return Ok(Vec::new());
    }
    let output = script::script_output(
        &spec.project_dir,
        &image.build_args_script,
        &BTreeMap::new(),
        tx,
    )
    .await?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

async fn run_docker(args: &[String], project_dir: &Path, verbose: bool) -> Result<()> {
    tracing::debug!(?args, "running docker");
    let mut cmd = Command::new("docker");
    cmd.args(args).current_dir(project_dir);
    if verbose {
        let status = cmd
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DistError::ToolFailed {
                tool: "docker".to_string(),
                code: -1,
                output: e.to_string(),
            })?;
        if status.success() {
            return Ok(());
        }
        return Err(DistError::ToolFailed {
            tool: "docker".to_string(),
            code: status.code().unwrap_or(-1),
            output: String::new(),
        }
        .into());
    }
    let output = cmd.output().await.map_err(|e| DistError::ToolFailed {
        tool: "docker".to_string(),
        code: -1,
        output: e.to_string(),
    })?;
    if output.status.success() {
        return Ok(());
    }
    let mut combined = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(stderr.trim());
    }
    Err(DistError::ToolFailed {
        tool: "docker".to_string(),
        code: output.status.code().unwrap_or(-1),
        output: combined,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{DockerDep, ProductConfig, SlsDockerInfo, VersionInfo};
    use std::path::PathBuf;

    fn spec_in(project_dir: &Path, name: &str) -> ProductSpec {
        ProductSpec {
            project_dir: project_dir.to_path_buf(),
            name: name.to_string(),
            version: "1.0.0".to_string(),
            version_info: VersionInfo::new("1.0.0", "1.0.0", "0"),
            config: ProductConfig::default(),
        }
    }

    fn with_deps(spec: &ProductSpec) -> SpecWithDeps {
        let mut all = BTreeMap::new();
        all.insert(spec.name.clone(), spec.clone());
        SpecWithDeps::new(spec.clone(), &all).unwrap()
    }

    #[test]
    fn base_repository_prefixes_the_repository() {
        let spec = spec_in(&PathBuf::from("/project"), "foo");
        let image = DockerImageConfig::default();
        assert_eq!(image_name(&spec, &image, ""), "foo:1.0.0");
        assert_eq!(
            image_name(&spec, &image, "registry.example.com/"),
            "registry.example.com/foo:1.0.0"
        );
    }

    #[test]
    fn sls_images_carry_manifest_and_configuration_labels() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("configuration.yml"), "key: value\n").unwrap();

        let spec = spec_in(dir.path(), "foo");
        let image = DockerImageConfig {
            info: Some(DockerImageInfo::Sls(SlsDockerInfo {
                group_id: "com.acme".to_string(),
                ..SlsDockerInfo::default()
            })),
            ..DockerImageConfig::default()
        };
        let labels = labels(&spec, &image, dir.path()).unwrap();
        assert_eq!(labels.len(), 2);

        assert_eq!(labels[0].0, MANIFEST_LABEL);
        let manifest = general_purpose::STANDARD.decode(&labels[0].1).unwrap();
        let manifest = String::from_utf8(manifest).unwrap();
        assert!(manifest.contains("product-group: com.acme"));
        assert!(manifest.contains("product-name: foo"));

        assert_eq!(labels[1].0, CONFIGURATION_LABEL);
        let configuration = general_purpose::STANDARD.decode(&labels[1].1).unwrap();
        assert_eq!(configuration, b"key: value\n");
    }

    #[test]
    fn default_images_have_no_labels() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_in(dir.path(), "foo");
        let image = DockerImageConfig::default();
        assert!(labels(&spec, &image, dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_dependency_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut dep_spec = spec_in(dir.path(), "lib");
        dep_spec.config.dist = vec![DistConfig {
            dist_type: Some(DistType::Bin(slipway_types::BinDistInfo::default())),
            ..DistConfig::default()
        }];
        let spec = spec_in(dir.path(), "app");
        let image = DockerImageConfig {
            dependencies: vec![DockerDep {
                product: "lib".to_string(),
                kind: DockerDepKind::Bin,
                target_file: String::new(),
            }],
            ..DockerImageConfig::default()
        };

        let mut all = BTreeMap::new();
        all.insert("lib".to_string(), with_deps(&dep_spec));
        let err = place_dependencies(&all, &spec, &image, dir.path()).unwrap_err();
        assert!(err.to_string().contains("run dist first"));
    }

    #[test]
    fn dependency_artifacts_land_under_their_target_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut dep_spec = spec_in(dir.path(), "lib");
        dep_spec.config.dist = vec![DistConfig {
            dist_type: Some(DistType::Bin(slipway_types::BinDistInfo::default())),
            ..DistConfig::default()
        }];
        let artifact = paths::dist_artifact_paths(&dep_spec, &dep_spec.config.dist[0])
            .into_iter()
            .next()
            .unwrap();
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, b"tarball").unwrap();

        let spec = spec_in(dir.path(), "app");
        let image = DockerImageConfig {
            dependencies: vec![DockerDep {
                product: "lib".to_string(),
                kind: DockerDepKind::Bin,
                target_file: "lib.tgz".to_string(),
            }],
            ..DockerImageConfig::default()
        };

        let context = dir.path().join("docker-context");
        std::fs::create_dir_all(&context).unwrap();
        let mut all = BTreeMap::new();
        all.insert("lib".to_string(), with_deps(&dep_spec));
        place_dependencies(&all, &spec, &image, &context).unwrap();
        assert_eq!(std::fs::read(context.join("lib.tgz")).unwrap(), b"tarball");
    }

    #[test]
    fn unconfigured_dist_kind_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dep_spec = spec_in(dir.path(), "lib");
        let spec = spec_in(dir.path(), "app");
        let image = DockerImageConfig {
            dependencies: vec![DockerDep {
                product: "lib".to_string(),
                kind: DockerDepKind::Rpm,
                target_file: String::new(),
            }],
            ..DockerImageConfig::default()
        };

        let mut all = BTreeMap::new();
        all.insert("lib".to_string(), with_deps(&dep_spec));
        let err = place_dependencies(&all, &spec, &image, dir.path()).unwrap_err();
        assert!(err.to_string().contains("no rpm dist"));
    }
}
