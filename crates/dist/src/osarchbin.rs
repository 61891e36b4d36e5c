//! Per-OS/arch binary distribution
//!
//! Stages one `<os>-<arch>/` subtree per configured target holding the
//! product's executable and those of its input products. Each subtree is
//! archived separately by the packager.

use crate::staging;
use slipway_errors::{DistError, Result};
use slipway_types::{paths, DistConfig, OsArch, OsArchsBinDistInfo, ProductSpec, SpecWithDeps};
use std::path::Path;

pub fn layout(
    with_deps: &SpecWithDeps,
    dist_cfg: &DistConfig,
    info: &OsArchsBinDistInfo,
    root: &Path,
) -> Result<()> {
    let spec = &with_deps.spec;
    let deps = crate::dist_deps(with_deps, dist_cfg)?;

    for os_arch in paths::os_archs_bin_targets(spec, info) {
        copy_target(spec, &os_arch, root)?;
        for dep in &deps {
            copy_target(dep, &os_arch, root)?;
        }
    }
    Ok(())
}

/// Copy one product's executable for one target into the staging tree;
/// the target must be in that product's build target set
fn copy_target(spec: &ProductSpec, os_arch: &OsArch, root: &Path) -> Result<()> {
    if spec.config.build.skip {
        return Ok(());
    }
    if !spec.config.build.os_archs.contains(os_arch) {
        return Err(DistError::OsArchNotBuilt {
            product: spec.name.clone(),
            os_arch: os_arch.to_string(),
        }
        .into());
    }
    let dest = root
        .join(os_arch.to_string())
        .join(os_arch.executable_name(&spec.name));
    staging::copy_executable(&paths::build_artifact_path(spec, os_arch), &dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{ProductConfig, VersionInfo};
    use std::collections::BTreeMap;

    fn spec_with_targets(dir: &Path, targets: Vec<OsArch>) -> SpecWithDeps {
        let mut config = ProductConfig::default();
        config.build.os_archs = targets;
        SpecWithDeps::new(
            ProductSpec {
                project_dir: dir.to_path_buf(),
                name: "foo".to_string(),
                version: "0.1.0".to_string(),
                version_info: VersionInfo::new("0.1.0", "0.1.0", "0"),
                config,
            },
            &BTreeMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn unbuilt_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let with_deps = spec_with_targets(dir.path(), vec![OsArch::new("linux", "amd64")]);
        let info = OsArchsBinDistInfo {
            os_archs: vec![OsArch::new("darwin", "arm64")],
        };

        let err = layout(&with_deps, &DistConfig::default(), &info, dir.path()).unwrap_err();
        assert!(err.to_string().contains("darwin-arm64"));
    }

    #[test]
    fn lays_out_one_subtree_per_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = OsArch::new("linux", "amd64");
        let with_deps = spec_with_targets(dir.path(), vec![target.clone()]);

        // fake build artifact
        let artifact = paths::build_artifact_path(&with_deps.spec, &target);
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, "binary").unwrap();

        let root = dir.path().join("dist/foo-0.1.0");
        std::fs::create_dir_all(&root).unwrap();
        layout(
            &with_deps,
            &DistConfig::default(),
            &OsArchsBinDistInfo::default(),
            &root,
        )
        .unwrap();
        assert!(root.join("linux-amd64/foo").is_file());
    }
}
