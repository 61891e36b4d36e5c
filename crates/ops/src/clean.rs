//! Removal of build and dist outputs

use crate::OpsCtx;
use slipway_errors::{Error, Result};
use slipway_events::EventEmitter;
use slipway_types::paths;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Remove the build and dist outputs of the requested products
///
/// A full clean (nothing requested) also removes the project-wide default
/// output directories. Directories that do not exist are skipped.
///
/// # Errors
///
/// Returns an error when a product cannot be resolved or a directory
/// exists but cannot be removed.
pub async fn clean(ctx: &OpsCtx, requested: &[String]) -> Result<()> {
    let specs = ctx.resolve(requested)?;

    // The same directory backs several products under default config;
    // collect first so each is removed once.
    let mut doomed: BTreeSet<PathBuf> = BTreeSet::new();
    if requested.is_empty() {
        doomed.insert(paths::project_build_output_dir(
            &ctx.project_dir,
            &ctx.config,
        ));
        doomed.insert(paths::project_dist_output_dir(&ctx.project_dir, &ctx.config));
    }
    for with_deps in &specs {
        let spec = &with_deps.spec;
        doomed.insert(paths::build_output_dir(spec));
        for dist_cfg in &spec.config.dist {
            doomed.insert(paths::dist_output_dir(spec, dist_cfg));
        }
    }

    for dir in doomed {
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => ctx.emit_debug(format!("removed {}", dir.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(Error::io_with_path(&err, &dir)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{ProductConfig, ProjectConfig, VersionInfo};
    use std::collections::BTreeMap;
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

    fn product(output_dir: &str) -> ProductConfig {
        let mut config = ProductConfig::default();
        config.build.main_pkg = ".".to_string();
        config.build.output_dir = output_dir.to_string();
        config
    }

    #[tokio::test]
    async fn full_clean_removes_default_directories() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("build/1.0.0")).unwrap();
        std::fs::create_dir_all(temp.path().join("dist")).unwrap();
        std::fs::write(temp.path().join("dist/widget-1.0.0.tgz"), b"x").unwrap();
        let mut products = BTreeMap::new();
        products.insert("widget".to_string(), product(""));
        let ctx = ctx_with(&temp, products);

        clean(&ctx, &[]).await.unwrap();
        assert!(!temp.path().join("build").exists());
        assert!(!temp.path().join("dist").exists());
    }

    #[tokio::test]
    async fn per_product_clean_leaves_other_outputs_alone() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("widget-out")).unwrap();
        std::fs::create_dir_all(temp.path().join("gadget-out")).unwrap();
        let mut products = BTreeMap::new();
        products.insert("widget".to_string(), product("widget-out"));
        products.insert("gadget".to_string(), product("gadget-out"));
        let ctx = ctx_with(&temp, products);

        clean(&ctx, &["widget".to_string()]).await.unwrap();
        assert!(!temp.path().join("widget-out").exists());
        assert!(temp.path().join("gadget-out").exists());
    }

    #[tokio::test]
    async fn missing_directories_are_not_an_error() {
        let temp = TempDir::new().unwrap();
        let mut products = BTreeMap::new();
        products.insert("widget".to_string(), product(""));
        let ctx = ctx_with(&temp, products);

        clean(&ctx, &[]).await.unwrap();
    }
}
