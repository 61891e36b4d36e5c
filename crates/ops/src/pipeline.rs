//! Build, dist, docker, publish, and run operations
//!
//! Each operation resolves the requested products and hands the resolved
//! specs to the engine crate that does the work.

use crate::OpsCtx;
use slipway_builder::BuildOptions;
use slipway_dist::{scheduler, DockerOptions};
use slipway_errors::{OpsError, Result};
use slipway_publish::{Destination, PublishOptions};
use slipway_types::{OsArch, SpecWithDeps};
use std::collections::BTreeMap;

/// Build the requested products for the targets in `filter`
///
/// # Errors
///
/// Returns an error when resolution fails or any build unit fails.
pub async fn build(
    ctx: &OpsCtx,
    requested: &[String],
    filter: &[OsArch],
    opts: &BuildOptions,
) -> Result<()> {
    let specs = ctx.resolve(requested)?;
    slipway_builder::build(&specs, filter, opts, &ctx.tx).await
}

/// Assemble every distribution of the requested products
///
/// # Errors
///
/// Returns an error when resolution fails, a build artifact is missing,
/// or a dist cannot be assembled.
pub async fn dist(ctx: &OpsCtx, requested: &[String]) -> Result<()> {
    let specs = ctx.resolve(requested)?;
    slipway_dist::dist_all(&specs, &ctx.tx).await
}

/// Build the container images of the requested products
///
/// Dist artifacts the images depend on are assembled first. With nothing
/// requested, every product that declares an image is built.
///
/// # Errors
///
/// Returns an error when resolution fails, the image dependencies contain
/// a cycle, or a dist or `docker build` fails.
pub async fn docker_build(ctx: &OpsCtx, requested: &[String], opts: &DockerOptions) -> Result<()> {
    let (all, names) = image_universe(ctx, requested)?;
    slipway_dist::build_images(&all, &names, opts, &ctx.tx).await
}

/// Push the built images of the requested products and their image
/// dependencies, in the scheduler's order
///
/// # Errors
///
/// Returns an error when resolution fails, the image dependencies contain
/// a cycle, or `docker push` fails.
pub async fn docker_push(ctx: &OpsCtx, requested: &[String], opts: &DockerOptions) -> Result<()> {
    let (all, names) = image_universe(ctx, requested)?;
    let plan = scheduler::plan(&all, &names)?;
    slipway_dist::push_images(&all, &plan.image_order, opts, &ctx.tx).await
}

/// Publish every distribution of the requested products to `destination`
///
/// # Errors
///
/// Returns an error when resolution, a prerequisite build or dist, or the
/// publish itself fails.
pub async fn publish(
    ctx: &OpsCtx,
    requested: &[String],
    destination: &Destination,
    opts: &PublishOptions,
) -> Result<()> {
    let specs = ctx.resolve(requested)?;
    slipway_publish::publish_products(&specs, destination, opts, &ctx.tx).await
}

/// Run a product's main package in place and return its exit code
///
/// With no product named, a project with a single product runs that
/// product.
///
/// # Errors
///
/// Returns an error when the request does not name exactly one product
/// or the compiler driver cannot run it.
pub async fn run(ctx: &OpsCtx, requested: &[String], args: &[String]) -> Result<i32> {
    let specs = ctx.resolve(requested)?;
    if specs.len() != 1 {
        return Err(OpsError::SingleProductRequired {
            operation: "run".to_string(),
            count: specs.len(),
        }
        .into());
    }
    slipway_builder::run_product(&specs[0].spec, args).await
}

/// Every product keyed by name, plus the image-declaring subset of the
/// requested products
fn image_universe(
    ctx: &OpsCtx,
    requested: &[String],
) -> Result<(BTreeMap<String, SpecWithDeps>, Vec<String>)> {
    let names: Vec<String> = ctx
        .resolve(requested)?
        .iter()
        .filter(|with_deps| !with_deps.spec.config.docker.is_empty())
        .map(|with_deps| with_deps.spec.name.clone())
        .collect();
    let all = ctx
        .resolve(&[])?
        .into_iter()
        .map(|with_deps| (with_deps.spec.name.clone(), with_deps))
        .collect();
    Ok((all, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{DockerDep, DockerImageConfig, ProductConfig, ProjectConfig, VersionInfo};
    use tempfile::TempDir;

    fn ctx_with(temp: &TempDir, products: BTreeMap<String, ProductConfig>) -> OpsCtx {
        let (tx, _rx) = slipway_events::channel();
        OpsCtx {
            project_dir: temp.path().to_path_buf(),
            config: ProjectConfig {
                products,
                ..ProjectConfig::default()
            },
            version: VersionInfo::new("1.0.0", "main", "0"),
            tx,
        }
    }

    fn imaged_product(dep_on: Option<&str>) -> ProductConfig {
        let mut config = ProductConfig::default();
        config.build.main_pkg = ".".to_string();
        config.build.os_archs = vec!["linux-amd64".parse().unwrap()];
        let mut image = DockerImageConfig::default();
        if let Some(product) = dep_on {
            image.dependencies.push(DockerDep {
                product: product.to_string(),
                kind: slipway_types::DockerDepKind::Docker,
                target_file: String::new(),
            });
        }
        config.docker.push(image);
        config
    }

    #[test]
    fn image_universe_defaults_to_image_declaring_products() {
        let temp = TempDir::new().unwrap();
        let mut products = BTreeMap::new();
        products.insert("base".to_string(), imaged_product(None));
        products.insert("app".to_string(), imaged_product(Some("base")));
        let mut plain = ProductConfig::default();
        plain.build.main_pkg = ".".to_string();
        products.insert("tool".to_string(), plain);
        let ctx = ctx_with(&temp, products);

        let (all, names) = image_universe(&ctx, &[]).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(names, vec!["app".to_string(), "base".to_string()]);
    }

    #[test]
    fn image_universe_keeps_the_whole_project_visible() {
        let temp = TempDir::new().unwrap();
        let mut products = BTreeMap::new();
        products.insert("base".to_string(), imaged_product(None));
        products.insert("app".to_string(), imaged_product(Some("base")));
        let ctx = ctx_with(&temp, products);

        // Requesting only `app` still exposes `base` for the closure
        let (all, names) = image_universe(&ctx, &["app".to_string()]).unwrap();
        assert_eq!(names, vec!["app".to_string()]);
        assert!(all.contains_key("base"));
        let plan = scheduler::plan(&all, &names).unwrap();
        assert_eq!(plan.image_order, vec!["base".to_string(), "app".to_string()]);
    }

    #[tokio::test]
    async fn run_requires_exactly_one_product() {
        let temp = TempDir::new().unwrap();
        let mut products = BTreeMap::new();
        products.insert("alpha".to_string(), imaged_product(None));
        products.insert("beta".to_string(), imaged_product(None));
        let ctx = ctx_with(&temp, products);

        let err = run(&ctx, &[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("exactly one product"));
    }
}
