//! Fully-resolved product specifications
//!
//! A [`ProductSpec`] is a product after defaulting: every inheritable field
//! carries its effective value and the version is fixed. [`SpecWithDeps`]
//! bundles a spec with the specs of every product it consumes, so downstream
//! stages never re-resolve.

use crate::config::ProductConfig;
use crate::version::VersionInfo;
use slipway_errors::{Result, SpecError};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A product with all configuration defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpec {
    /// Absolute project root directory
    pub project_dir: PathBuf,
    /// Product name
    pub name: String,
    /// Effective version string
    pub version: String,
    /// Version plus branch and revision
    pub version_info: VersionInfo,
    /// Resolved configuration
    pub config: ProductConfig,
}

impl ProductSpec {
    /// Names of products whose outputs this product consumes
    #[must_use]
    pub fn input_product_names(&self) -> Vec<String> {
        self.config.input_product_names()
    }
}

/// A product spec plus the specs of its input products
#[derive(Debug, Clone, PartialEq)]
pub struct SpecWithDeps {
    pub spec: ProductSpec,
    /// Input product name to spec, for every product named by
    /// `input-products` or a docker dependency
    pub deps: BTreeMap<String, ProductSpec>,
}

impl SpecWithDeps {
    /// Pairs a spec with its dependencies drawn from `all`
    ///
    /// # Errors
    ///
    /// Returns an error if any referenced input product has no spec in `all`.
    pub fn new(spec: ProductSpec, all: &BTreeMap<String, ProductSpec>) -> Result<Self> {
        let mut deps = BTreeMap::new();
        for input in spec.input_product_names() {
            match all.get(&input) {
                Some(dep) => {
                    deps.insert(input, dep.clone());
                }
                None => {
                    return Err(SpecError::UnresolvedInputProduct {
                        product: spec.name.clone(),
                        input,
                        known: all.keys().cloned().collect(),
                    }
                    .into());
                }
            }
        }
        Ok(Self { spec, deps })
    }

    /// Dependency spec for `name`
    #[must_use]
    pub fn dep(&self, name: &str) -> Option<&ProductSpec> {
        self.deps.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistConfig, DockerDep, DockerDepKind, DockerImageConfig};

    fn spec(name: &str) -> ProductSpec {
        ProductSpec {
            project_dir: PathBuf::from("/project"),
            name: name.to_string(),
            version: "1.0.0".to_string(),
            version_info: VersionInfo::new("1.0.0", "1.0.0", "0"),
            config: ProductConfig::default(),
        }
    }

    #[test]
    fn input_names_merge_dist_and_docker() {
        let mut s = spec("app");
        s.config.dist = vec![DistConfig {
            input_products: vec!["tool".to_string(), "agent".to_string()],
            ..DistConfig::default()
        }];
        s.config.docker = vec![DockerImageConfig {
            dependencies: vec![DockerDep {
                product: "agent".to_string(),
                kind: DockerDepKind::Bin,
                target_file: String::new(),
            }],
            ..DockerImageConfig::default()
        }];
        assert_eq!(s.input_product_names(), vec!["agent", "tool"]);
    }

    #[test]
    fn with_deps_requires_every_input() {
        let mut s = spec("app");
        s.config.dist = vec![DistConfig {
            input_products: vec!["missing".to_string()],
            ..DistConfig::default()
        }];
        let all: BTreeMap<String, ProductSpec> =
            [("app".to_string(), s.clone())].into_iter().collect();
        let err = SpecWithDeps::new(s, &all).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn with_deps_collects_inputs() {
        let mut s = spec("app");
        s.config.dist = vec![DistConfig {
            input_products: vec!["tool".to_string()],
            ..DistConfig::default()
        }];
        let all: BTreeMap<String, ProductSpec> = [
            ("app".to_string(), s.clone()),
            ("tool".to_string(), spec("tool")),
        ]
        .into_iter()
        .collect();
        let with_deps = SpecWithDeps::new(s, &all).unwrap();
        assert_eq!(with_deps.deps.len(), 1);
        assert_eq!(with_deps.dep("tool").map(|d| d.name.as_str()), Some("tool"));
    }
}
