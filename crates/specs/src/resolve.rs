//! Resolution from project configuration to specs-with-deps

use crate::discover::discover_main_packages;
use slipway_config::ExcludeMatcher;
use slipway_errors::{Result, SpecError};
use slipway_types::{
    DistConfig, DistType, OsArch, OsArchsBinDistInfo, ProductConfig, ProductSpec, ProjectConfig,
    SpecWithDeps, VersionInfo,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Almanac tag every service-layout dist publishes with
const SLS_ALMANAC_TAG: &str = "slsv2";

/// Resolve the products of a project into fully-defaulted specs
///
/// `requested` restricts the returned specs; input products of a requested
/// product are still resolved so its deps map is complete. The result is
/// ordered lexicographically by product name.
///
/// # Errors
///
/// Returns an error if discovery fails, a requested name is unknown, the
/// final set is empty, or an input product cannot be resolved.
pub fn resolve(
    project_dir: &Path,
    config: &ProjectConfig,
    requested: &[String],
    version: &VersionInfo,
) -> Result<Vec<SpecWithDeps>> {
    let matcher = ExcludeMatcher::new(&config.exclude)?;

    let mut products: BTreeMap<String, ProductConfig> = if config.products.is_empty() {
        discover_main_packages(project_dir, &matcher)?
            .into_iter()
            .map(|found| {
                let mut product = ProductConfig::default();
                product.build.main_pkg = found.main_pkg;
                (found.name, product)
            })
            .collect()
    } else {
        config.products.clone()
    };

    products.retain(|name, _| !matcher.matches_name(name));

    if !requested.is_empty() {
        let mut unknown: Vec<String> = requested
            .iter()
            .filter(|name| !products.contains_key(*name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            unknown.dedup();
            return Err(SpecError::UnknownProducts {
                unknown,
                known: products.keys().cloned().collect(),
            }
            .into());
        }
    }

    if products.is_empty() {
        return Err(SpecError::NoProducts.into());
    }

    let specs: BTreeMap<String, ProductSpec> = products
        .into_iter()
        .map(|(name, product)| {
            let spec = ProductSpec {
                project_dir: project_dir.to_path_buf(),
                name: name.clone(),
                version: version.version.clone(),
                version_info: version.clone(),
                config: materialize(product, config),
            };
            (name, spec)
        })
        .collect();

    specs
        .values()
        .filter(|spec| requested.is_empty() || requested.contains(&spec.name))
        .map(|spec| SpecWithDeps::new(spec.clone(), &specs))
        .collect()
}

/// Apply configuration defaults to one product
fn materialize(mut product: ProductConfig, project: &ProjectConfig) -> ProductConfig {
    if product.build.main_pkg.is_empty() {
        product.build.main_pkg = ".".to_string();
    }
    if product.build.output_dir.is_empty() {
        product.build.output_dir = project.build_output_dir.clone();
    }
    if product.build.os_archs.is_empty() {
        product.build.os_archs = vec![OsArch::host()];
    }

    if product.dist.is_empty() {
        product.dist.push(DistConfig::default());
    }
    if product.publish.group_id.is_empty() {
        product.publish.group_id = project.group_id.clone();
    }

    for dist in &mut product.dist {
        if dist.output_dir.is_empty() {
            dist.output_dir = project.dist_output_dir.clone();
        }

        // a dist without a type is the implicit per-target archive
        match &mut dist.dist_type {
            None => {
                dist.dist_type = Some(DistType::OsArchsBin(OsArchsBinDistInfo {
                    os_archs: product.build.os_archs.clone(),
                }));
            }
            Some(DistType::OsArchsBin(info)) if info.os_archs.is_empty() => {
                info.os_archs = product.build.os_archs.clone();
            }
            Some(_) => {}
        }

        if dist.publish.group_id.is_empty() {
            dist.publish.group_id = product.publish.group_id.clone();
        }
        if dist.publish.almanac.metadata.is_empty() && dist.publish.almanac.tags.is_empty() {
            dist.publish.almanac = product.publish.almanac.clone();
        }
        if matches!(dist.dist_type, Some(DistType::Sls(_)))
            && !dist
                .publish
                .almanac
                .tags
                .iter()
                .any(|tag| tag == SLS_ALMANAC_TAG)
        {
            dist.publish.almanac.tags.push(SLS_ALMANAC_TAG.to_string());
        }

        if !dist.script.is_empty() && !project.dist_script_include.is_empty() {
            dist.script = format!("{}\n{}", project.dist_script_include, dist.script);
        }
    }

    product
}
