//! Artifact path tables
//!
//! Pure functions mapping a resolved [`ProductSpec`] to the on-disk
//! locations of build and dist outputs. Every stage (builder, dist engine,
//! publisher, CLI printing) goes through these so the layout is defined in
//! one place.

use crate::config::{DistConfig, DistType, DockerImageConfig, OsArchsBinDistInfo, ProjectConfig};
use crate::osarch::OsArch;
use crate::spec::ProductSpec;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project build output directory when none is configured
pub const DEFAULT_BUILD_OUTPUT_DIR: &str = "build";
/// Project dist output directory when none is configured
pub const DEFAULT_DIST_OUTPUT_DIR: &str = "dist";

fn effective<'a>(dir: &'a str, default: &'a str) -> &'a str {
    if dir.is_empty() {
        default
    } else {
        dir
    }
}

/// Project-wide build output root: `<projectDir>/<buildOutputDir>`
#[must_use]
pub fn project_build_output_dir(project_dir: &Path, config: &ProjectConfig) -> PathBuf {
    project_dir.join(effective(
        &config.build_output_dir,
        DEFAULT_BUILD_OUTPUT_DIR,
    ))
}

/// Project-wide dist output root: `<projectDir>/<distOutputDir>`
#[must_use]
pub fn project_dist_output_dir(project_dir: &Path, config: &ProjectConfig) -> PathBuf {
    project_dir.join(effective(&config.dist_output_dir, DEFAULT_DIST_OUTPUT_DIR))
}

/// Build output root of one product: `<projectDir>/<buildOutputDir>`
#[must_use]
pub fn build_output_dir(spec: &ProductSpec) -> PathBuf {
    spec.project_dir.join(effective(
        &spec.config.build.output_dir,
        DEFAULT_BUILD_OUTPUT_DIR,
    ))
}

/// Directory holding the build artifact for one target:
/// `<projectDir>/<buildOutputDir>/<version>/<os>-<arch>`
#[must_use]
pub fn build_artifact_dir(spec: &ProductSpec, os_arch: &OsArch) -> PathBuf {
    build_output_dir(spec)
        .join(&spec.version)
        .join(os_arch.to_string())
}

/// Full path of the build artifact for one target; windows binaries
/// carry `.exe`
#[must_use]
pub fn build_artifact_path(spec: &ProductSpec, os_arch: &OsArch) -> PathBuf {
    build_artifact_dir(spec, os_arch).join(os_arch.executable_name(&spec.name))
}

/// Artifact paths for every configured target, keyed by target
///
/// A non-empty `filter` restricts the result to the listed targets;
/// filter entries outside the configured set are absent from the result.
#[must_use]
pub fn build_artifacts(spec: &ProductSpec, filter: &[OsArch]) -> BTreeMap<OsArch, PathBuf> {
    spec.config
        .build
        .os_archs
        .iter()
        .filter(|os_arch| filter.is_empty() || filter.contains(os_arch))
        .map(|os_arch| (os_arch.clone(), build_artifact_path(spec, os_arch)))
        .collect()
}

/// Dist output directory for one dist: `<projectDir>/<distOutputDir>`
#[must_use]
pub fn dist_output_dir(spec: &ProductSpec, dist: &DistConfig) -> PathBuf {
    spec.project_dir
        .join(effective(&dist.output_dir, DEFAULT_DIST_OUTPUT_DIR))
}

/// Staging root for one dist: `<distOutputDir>/<name>-<version>`
#[must_use]
pub fn dist_work_dir(spec: &ProductSpec, dist: &DistConfig) -> PathBuf {
    dist_output_dir(spec, dist).join(format!("{}-{}", spec.name, spec.version))
}

/// Targets of an os-archs-bin dist; an empty list inherits the build targets
#[must_use]
pub fn os_archs_bin_targets(spec: &ProductSpec, info: &OsArchsBinDistInfo) -> Vec<OsArch> {
    if info.os_archs.is_empty() {
        spec.config.build.os_archs.clone()
    } else {
        info.os_archs.clone()
    }
}

/// File names of the artifacts one dist produces
///
/// A dist without an explicit type is the implicit os-archs-bin dist.
#[must_use]
pub fn dist_artifact_names(spec: &ProductSpec, dist: &DistConfig) -> Vec<String> {
    let base = format!("{}-{}", spec.name, spec.version);
    match &dist.dist_type {
        Some(DistType::Sls(_)) => vec![format!("{base}.sls.tgz")],
        Some(DistType::Bin(_)) => vec![format!("{base}.tgz")],
        Some(DistType::Rpm(info)) => vec![format!("{base}-{}.x86_64.rpm", info.release)],
        Some(DistType::Manual(info)) => {
            if info.extension.is_empty() {
                vec![base]
            } else {
                vec![format!("{base}.{}", info.extension)]
            }
        }
        Some(DistType::OsArchsBin(info)) => os_archs_bin_targets(spec, info)
            .iter()
            .map(|os_arch| format!("{base}-{os_arch}.tgz"))
            .collect(),
        None => os_archs_bin_targets(spec, &OsArchsBinDistInfo::default())
            .iter()
            .map(|os_arch| format!("{base}-{os_arch}.tgz"))
            .collect(),
    }
}

/// Full paths of the artifacts one dist produces
#[must_use]
pub fn dist_artifact_paths(spec: &ProductSpec, dist: &DistConfig) -> Vec<PathBuf> {
    let out = dist_output_dir(spec, dist);
    dist_artifact_names(spec, dist)
        .into_iter()
        .map(|name| out.join(name))
        .collect()
}

/// Image repository for a docker config; empty defaults to the product name
#[must_use]
pub fn docker_repository(spec: &ProductSpec, image: &DockerImageConfig) -> String {
    if image.repository.is_empty() {
        spec.name.clone()
    } else {
        image.repository.clone()
    }
}

/// Image tag for a docker config; empty defaults to the product version
#[must_use]
pub fn docker_tag(spec: &ProductSpec, image: &DockerImageConfig) -> String {
    if image.tag.is_empty() {
        spec.version.clone()
    } else {
        image.tag.clone()
    }
}

/// Full image name `<repository>:<tag>`
#[must_use]
pub fn docker_image(spec: &ProductSpec, image: &DockerImageConfig) -> String {
    format!(
        "{}:{}",
        docker_repository(spec, image),
        docker_tag(spec, image)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ManualDistInfo, ProductConfig, RpmDistInfo};
    use crate::version::VersionInfo;

    fn spec() -> ProductSpec {
        let mut config = ProductConfig::default();
        config.build.os_archs = vec![
            OsArch::new("darwin", "amd64"),
            OsArch::new("linux", "amd64"),
            OsArch::new("windows", "amd64"),
        ];
        ProductSpec {
            project_dir: PathBuf::from("/project"),
            name: "foo".to_string(),
            version: "0.1.0".to_string(),
            version_info: VersionInfo::new("0.1.0", "0.1.0", "0"),
            config,
        }
    }

    #[test]
    fn build_artifact_paths_are_deterministic() {
        let spec = spec();
        assert_eq!(
            build_artifact_path(&spec, &OsArch::new("linux", "amd64")),
            PathBuf::from("/project/build/0.1.0/linux-amd64/foo")
        );
        assert_eq!(
            build_artifact_path(&spec, &OsArch::new("windows", "amd64")),
            PathBuf::from("/project/build/0.1.0/windows-amd64/foo.exe")
        );
    }

    #[test]
    fn build_artifacts_honors_filter() {
        let spec = spec();
        let all = build_artifacts(&spec, &[]);
        assert_eq!(all.len(), 3);

        let filtered = build_artifacts(&spec, &[OsArch::new("linux", "amd64")]);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key(&OsArch::new("linux", "amd64")));

        // requesting a target outside the configured set yields nothing
        let none = build_artifacts(&spec, &[OsArch::new("linux", "arm64")]);
        assert!(none.is_empty());
    }

    #[test]
    fn build_output_dir_override_is_used() {
        let mut spec = spec();
        spec.config.build.output_dir = "out".to_string();
        assert_eq!(
            build_artifact_path(&spec, &OsArch::new("linux", "amd64")),
            PathBuf::from("/project/out/0.1.0/linux-amd64/foo")
        );
    }

    #[test]
    fn dist_artifact_names_per_variant() {
        let spec = spec();
        let mut dist = DistConfig::default();

        dist.dist_type = Some(DistType::Sls(Default::default()));
        assert_eq!(dist_artifact_names(&spec, &dist), vec!["foo-0.1.0.sls.tgz"]);

        dist.dist_type = Some(DistType::Bin(Default::default()));
        assert_eq!(dist_artifact_names(&spec, &dist), vec!["foo-0.1.0.tgz"]);

        dist.dist_type = Some(DistType::Rpm(RpmDistInfo::default()));
        assert_eq!(
            dist_artifact_names(&spec, &dist),
            vec!["foo-0.1.0-1.x86_64.rpm"]
        );

        dist.dist_type = Some(DistType::Manual(ManualDistInfo {
            extension: "zip".to_string(),
        }));
        assert_eq!(dist_artifact_names(&spec, &dist), vec!["foo-0.1.0.zip"]);
    }

    #[test]
    fn implicit_dist_archives_every_build_target() {
        let spec = spec();
        let dist = DistConfig::default();
        assert_eq!(
            dist_artifact_names(&spec, &dist),
            vec![
                "foo-0.1.0-darwin-amd64.tgz",
                "foo-0.1.0-linux-amd64.tgz",
                "foo-0.1.0-windows-amd64.tgz",
            ]
        );
        assert_eq!(
            dist_artifact_paths(&spec, &dist)[0],
            PathBuf::from("/project/dist/foo-0.1.0-darwin-amd64.tgz")
        );
    }

    #[test]
    fn docker_names_default_to_product_and_version() {
        let spec = spec();
        let image = DockerImageConfig::default();
        assert_eq!(docker_image(&spec, &image), "foo:0.1.0");

        let named = DockerImageConfig {
            repository: "registry.example.com/foo".to_string(),
            tag: "latest".to_string(),
            ..DockerImageConfig::default()
        };
        assert_eq!(docker_image(&spec, &named), "registry.example.com/foo:latest");
    }
}
