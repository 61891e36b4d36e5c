//! Glob matcher backing the project and YAML-validation exclusions

use globset::{Glob, GlobSet, GlobSetBuilder};
use slipway_errors::{ConfigError, Result};
use slipway_types::ExcludeConfig;
use std::path::Path;

/// Compiled form of an [`ExcludeConfig`]
///
/// Name globs match bare names (product names, file basenames); path globs
/// match a relative path or any of its ancestors, so excluding a directory
/// excludes everything under it.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
    names: GlobSet,
    paths: GlobSet,
}

impl ExcludeMatcher {
    /// Compile an exclusion configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is not a valid glob.
    pub fn new(config: &ExcludeConfig) -> Result<Self> {
        Ok(Self {
            names: build_set(&config.names)?,
            paths: build_set(&config.paths)?,
        })
    }

    /// Whether a bare name is excluded
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.names.is_match(Path::new(name))
    }

    /// Whether a relative path is excluded, by its basename or any
    /// ancestor path
    #[must_use]
    pub fn matches_path(&self, path: &Path) -> bool {
        if path
            .file_name()
            .is_some_and(|name| self.names.is_match(Path::new(name)))
        {
            return true;
        }
        path.ancestors()
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .any(|ancestor| self.paths.is_match(ancestor))
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidExcludePattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| {
            ConfigError::InvalidExcludePattern {
                pattern: patterns.join(", "),
                message: e.to_string(),
            }
            .into()
        })
}
