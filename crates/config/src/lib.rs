#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Project configuration loading for slipway
//!
//! Reads the `slipway.yml` at a project root into the
//! [`ProjectConfig`](slipway_types::ProjectConfig) model. A missing file is
//! not an error: the empty configuration kicks in and product auto-discovery
//! takes over downstream.

mod matcher;

pub use matcher::ExcludeMatcher;

use slipway_errors::{ConfigError, Result};
use slipway_types::ProjectConfig;
use std::path::Path;
use tokio::fs;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "slipway.yml";

/// Load project configuration from a file
///
/// # Errors
///
/// Returns an error if the file cannot be read or its contents are not a
/// valid project configuration.
pub async fn load_from_file(path: &Path) -> Result<ProjectConfig> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    serde_yml::from_str(&contents)
        .map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
        .map_err(Into::into)
}

/// Load the configuration for a project directory
///
/// An explicit `path` must exist; with no explicit path the project's
/// `slipway.yml` is used when present and defaults apply otherwise.
///
/// # Errors
///
/// Returns an error if a configuration file exists but cannot be read or
/// parsed.
pub async fn load_or_default(project_dir: &Path, path: Option<&Path>) -> Result<ProjectConfig> {
    match path {
        Some(explicit) => load_from_file(explicit).await,
        None => {
            let candidate = project_dir.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                load_from_file(&candidate).await
            } else {
                Ok(ProjectConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(dir.path(), None).await.unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yml");
        let err = load_or_default(dir.path(), Some(&missing)).await.unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[tokio::test]
    async fn project_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "group-id: com.test.group\n",
        )
        .unwrap();
        let config = load_or_default(dir.path(), None).await.unwrap();
        assert_eq!(config.group_id, "com.test.group");
    }

    #[tokio::test]
    async fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "products: [not, a, mapping]\n").unwrap();
        let err = load_from_file(&path).await.unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
