//! Read-only queries backing the listing commands

use crate::OpsCtx;
use slipway_builder::freshness;
use slipway_errors::{Error, Result};
use slipway_types::{paths, OsArch};
use std::path::{Path, PathBuf};

/// Options for the build-artifact listing
#[derive(Debug, Clone, Default)]
pub struct BuildArtifactsOptions {
    /// Restrict the listing to these targets
    pub os_archs: Vec<OsArch>,
    /// Render absolute paths instead of project-relative ones
    pub absolute: bool,
    /// Keep only artifacts whose sources require a rebuild
    pub requires_build: bool,
}

/// The version the project builds as
#[must_use]
pub fn project_version(ctx: &OpsCtx) -> String {
    ctx.version.version.clone()
}

/// Names of every product, in lexicographic order
///
/// # Errors
///
/// Returns an error when the project has no products.
pub fn list_products(ctx: &OpsCtx) -> Result<Vec<String>> {
    Ok(ctx
        .resolve(&[])?
        .into_iter()
        .map(|with_deps| with_deps.spec.name)
        .collect())
}

/// Paths of the build artifacts the requested products would produce
///
/// Products whose build is skipped have no artifacts and are absent.
///
/// # Errors
///
/// Returns an error when a product cannot be resolved or a path cannot
/// be made absolute.
pub fn list_build_artifacts(
    ctx: &OpsCtx,
    requested: &[String],
    opts: &BuildArtifactsOptions,
) -> Result<Vec<PathBuf>> {
    let specs = ctx.resolve(requested)?;
    let oracle = opts
        .requires_build
        .then(|| freshness::check(&specs, &opts.os_archs));

    let mut listing = Vec::new();
    for with_deps in &specs {
        let spec = &with_deps.spec;
        if spec.config.build.skip {
            continue;
        }
        for (os_arch, path) in paths::build_artifacts(spec, &opts.os_archs) {
            if let Some(oracle) = &oracle {
                if !oracle.requires_build(&spec.name, &os_arch) {
                    continue;
                }
            }
            listing.push(render(&ctx.project_dir, path, opts.absolute)?);
        }
    }
    Ok(listing)
}

/// Paths of the dist artifacts the requested products would produce
///
/// # Errors
///
/// Returns an error when a product cannot be resolved or a path cannot
/// be made absolute.
pub fn list_dist_artifacts(
    ctx: &OpsCtx,
    requested: &[String],
    absolute: bool,
) -> Result<Vec<PathBuf>> {
    let specs = ctx.resolve(requested)?;
    let mut listing = Vec::new();
    for with_deps in &specs {
        let spec = &with_deps.spec;
        for dist_cfg in &spec.config.dist {
            for path in paths::dist_artifact_paths(spec, dist_cfg) {
                listing.push(render(&ctx.project_dir, path, absolute)?);
            }
        }
    }
    Ok(listing)
}

/// `repository:tag` names of the images the requested products declare
///
/// # Errors
///
/// Returns an error when a product cannot be resolved.
pub fn list_docker_images(ctx: &OpsCtx, requested: &[String]) -> Result<Vec<String>> {
    let specs = ctx.resolve(requested)?;
    let mut listing = Vec::new();
    for with_deps in &specs {
        let spec = &with_deps.spec;
        for image in &spec.config.docker {
            listing.push(paths::docker_image(spec, image));
        }
    }
    Ok(listing)
}

fn render(project_dir: &Path, path: PathBuf, absolute: bool) -> Result<PathBuf> {
    if absolute {
        return std::path::absolute(&path).map_err(|e| Error::io_with_path(&e, &path));
    }
    match path.strip_prefix(project_dir) {
        Ok(rel) => Ok(rel.to_path_buf()),
        Err(_) => Ok(path),
    }
}
