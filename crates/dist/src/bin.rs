//! Binary-archive distribution
//!
//! Stages `bin/<os>-<arch>/<product>` for every build target plus a
//! launcher script that picks the right executable at runtime.

use crate::{staging, template};
use slipway_errors::{Error, Result};
use slipway_types::{paths, BinDistInfo, DistConfig, ProductSpec, SpecWithDeps};
use std::path::Path;

const DEFAULT_LAUNCHER_TEMPLATE: &str = include_str!("../templates/launcher.sh.tera");

pub fn layout(
    with_deps: &SpecWithDeps,
    dist_cfg: &DistConfig,
    info: &BinDistInfo,
    root: &Path,
) -> Result<()> {
    let spec = &with_deps.spec;

    copy_binaries(spec, root)?;
    for dep in crate::dist_deps(with_deps, dist_cfg)? {
        copy_binaries(dep, root)?;
    }

    if !info.omit_init_sh {
        let launcher = launcher_script(spec, dist_cfg, info)?;
        let launcher_path = root.join("bin").join(format!("{}.sh", spec.name));
        if let Some(parent) = launcher_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(&e, parent))?;
        }
        std::fs::write(&launcher_path, launcher)
            .map_err(|e| Error::io_with_path(&e, &launcher_path))?;
        staging::make_executable(&launcher_path)?;
    }
    Ok(())
}

fn launcher_script(spec: &ProductSpec, dist_cfg: &DistConfig, info: &BinDistInfo) -> Result<String> {
    if info.init_sh_template_file.is_empty() {
        return template::render("launcher.sh", DEFAULT_LAUNCHER_TEMPLATE, spec, dist_cfg);
    }
    let path = spec.project_dir.join(&info.init_sh_template_file);
    let raw = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(&e, &path))?;
    template::render("launcher.sh", &raw, spec, dist_cfg)
}

fn copy_binaries(spec: &ProductSpec, root: &Path) -> Result<()> {
    if spec.config.build.skip {
        return Ok(());
    }
    for (os_arch, artifact) in paths::build_artifacts(spec, &[]) {
        let dest = root
            .join("bin")
            .join(os_arch.to_string())
            .join(os_arch.executable_name(&spec.name));
        staging::copy_executable(&artifact, &dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{ProductConfig, VersionInfo};
    use std::path::PathBuf;

    #[test]
    fn default_launcher_dispatches_by_os_and_arch() {
        let spec = ProductSpec {
            project_dir: PathBuf::from("/project"),
            name: "foo".to_string(),
            version: "0.1.0".to_string(),
            version_info: VersionInfo::new("0.1.0", "0.1.0", "0"),
            config: ProductConfig::default(),
        };
        let launcher = launcher_script(&spec, &DistConfig::default(), &BinDistInfo::default()).unwrap();
        assert!(launcher.starts_with("#!/bin/bash"));
        assert!(launcher.contains("$OS-$ARCH/foo"));
    }
}
