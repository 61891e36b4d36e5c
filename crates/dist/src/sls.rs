//! Service-layout distribution
//!
//! Stages `deployment/manifest.yml`, `service/bin/init.sh`, and the
//! per-target executables of the product and its input products, then
//! validates the tree against the layout specification and checks every
//! YAML file for well-formedness.

use crate::{staging, template};
use slipway_config::ExcludeMatcher;
use slipway_errors::{DistError, Error, Result};
use slipway_types::{paths, DistConfig, ExcludeConfig, ProductSpec, SlsDistInfo, SpecWithDeps};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

const DEFAULT_INIT_TEMPLATE: &str = include_str!("../templates/sls-init.sh.tera");

pub fn layout(
    with_deps: &SpecWithDeps,
    dist_cfg: &DistConfig,
    info: &SlsDistInfo,
    root: &Path,
) -> Result<()> {
    let spec = &with_deps.spec;

    let manifest = manifest_content(spec, dist_cfg, info)?;
    write_file(&root.join("deployment/manifest.yml"), &manifest)?;

    let init = init_script(spec, dist_cfg, info)?;
    let init_path = root.join("service/bin/init.sh");
    write_file(&init_path, &init)?;
    staging::make_executable(&init_path)?;

    copy_binaries(spec, root)?;
    for dep in crate::dist_deps(with_deps, dist_cfg)? {
        copy_binaries(dep, root)?;
    }

    validate_layout(spec, root)?;
    validate_yaml(root, &info.yaml_validation_exclude)
}

fn manifest_content(spec: &ProductSpec, dist_cfg: &DistConfig, info: &SlsDistInfo) -> Result<String> {
    if info.manifest_template_file.is_empty() {
        return default_manifest(spec, dist_cfg, info);
    }
    let path = spec.project_dir.join(&info.manifest_template_file);
    let raw = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(&e, &path))?;
    template::render("manifest.yml", &raw, spec, dist_cfg)
}

fn default_manifest(spec: &ProductSpec, dist_cfg: &DistConfig, info: &SlsDistInfo) -> Result<String> {
    let mut extensions = info.manifest_extensions.clone();
    if info.reloadable {
        extensions
            .entry("reloadable".to_string())
            .or_insert(serde_yml::Value::Bool(true));
    }
    manifest_text(
        &dist_cfg.publish.group_id,
        &spec.name,
        &spec.version,
        &info.product_type,
        &extensions,
    )
}

/// The default manifest form: a fixed header plus `product-type` and
/// `extensions` blocks only when non-empty
pub(crate) fn manifest_text(
    group_id: &str,
    name: &str,
    version: &str,
    product_type: &str,
    extensions: &BTreeMap<String, serde_yml::Value>,
) -> Result<String> {
    let mut manifest = format!(
        "manifest-version: \"1.0\"\nproduct-group: {group_id}\nproduct-name: {name}\nproduct-version: {version}\n"
    );
    if !product_type.is_empty() {
        manifest.push_str(&format!("product-type: {product_type}\n"));
    }
    if !extensions.is_empty() {
        let rendered =
            serde_yml::to_string(extensions).map_err(|e| DistError::TemplateFailed {
                name: "manifest.yml".to_string(),
                message: e.to_string(),
            })?;
        manifest.push_str("extensions:\n");
        for line in rendered.lines() {
            manifest.push_str("  ");
            manifest.push_str(line);
            manifest.push('\n');
        }
    }
    Ok(manifest)
}

fn init_script(spec: &ProductSpec, dist_cfg: &DistConfig, info: &SlsDistInfo) -> Result<String> {
    if info.init_script_template_file.is_empty() {
        return template::render("init.sh", DEFAULT_INIT_TEMPLATE, spec, dist_cfg);
    }
    let path = spec.project_dir.join(&info.init_script_template_file);
    let raw = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(&e, &path))?;
    template::render("init.sh", &raw, spec, dist_cfg)
}

fn copy_binaries(spec: &ProductSpec, root: &Path) -> Result<()> {
    if spec.config.build.skip {
        return Ok(());
    }
    for (os_arch, artifact) in paths::build_artifacts(spec, &[]) {
        let dest = root
            .join("service/bin")
            .join(os_arch.to_string())
            .join(os_arch.executable_name(&spec.name));
        staging::copy_executable(&artifact, &dest)?;
    }
    Ok(())
}

fn validate_layout(spec: &ProductSpec, root: &Path) -> Result<()> {
    let mut required = vec![
        "deployment/manifest.yml".to_string(),
        "service/bin/init.sh".to_string(),
    ];
    if !spec.config.build.skip {
        for os_arch in &spec.config.build.os_archs {
            required.push(format!(
                "service/bin/{os_arch}/{}",
                os_arch.executable_name(&spec.name)
            ));
        }
    }
    let missing: Vec<String> = required
        .into_iter()
        .filter(|rel| !root.join(rel).is_file())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DistError::LayoutIncomplete {
            product: spec.name.clone(),
            missing,
        }
        .into())
    }
}

/// Check every `*.yml`/`*.yaml` under the root for syntactic validity,
/// excluding paths matched by the configured matcher
fn validate_yaml(root: &Path, exclude: &ExcludeConfig) -> Result<()> {
    let matcher = ExcludeMatcher::new(exclude)?;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.map_err(|e| Error::internal(format!("walking {}: {e}", root.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if ext != "yml" && ext != "yaml" {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or_else(|_| entry.path());
        if matcher.matches_path(rel) {
            continue;
        }
        let content = std::fs::read_to_string(entry.path())
            .map_err(|e| Error::io_with_path(&e, entry.path()))?;
        if let Err(e) = serde_yml::from_str::<serde_yml::Value>(&content) {
            return Err(DistError::InvalidYaml {
                path: rel.display().to_string(),
                message: e.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(&e, parent))?;
    }
    std::fs::write(path, content).map_err(|e| Error::io_with_path(&e, path))?;
    Ok(())
}
