//! Manual distribution
//!
//! The user's dist script is responsible for producing
//! `$DIST_DIR/<product>-<version>[.<ext>]`; packaging just moves that
//! file to its final location.

use crate::staging;
use slipway_errors::{DistError, Result};
use slipway_types::ProductSpec;
use std::path::Path;

pub fn package(spec: &ProductSpec, staging_root: &Path, artifact: &Path) -> Result<()> {
    let file_name = artifact.file_name().unwrap_or_default();
    let produced = staging_root.join(file_name);
    if !produced.is_file() {
        return Err(DistError::ManualArtifactMissing {
            product: spec.name.clone(),
            expected: produced.display().to_string(),
        }
        .into());
    }
    staging::copy_file(&produced, artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::{ProductConfig, VersionInfo};
    use std::path::PathBuf;

    fn spec() -> ProductSpec {
        ProductSpec {
            project_dir: PathBuf::from("/project"),
            name: "foo".to_string(),
            version: "0.1.0".to_string(),
            version_info: VersionInfo::new("0.1.0", "0.1.0", "0"),
            config: ProductConfig::default(),
        }
    }

    #[test]
    fn missing_script_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = package(&spec(), dir.path(), &dir.path().join("out/foo-0.1.0.zip")).unwrap_err();
        assert!(err.to_string().contains("foo-0.1.0.zip"));
    }

    #[test]
    fn produced_file_is_moved_to_the_artifact_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo-0.1.0.zip"), "zip").unwrap();

        let artifact = dir.path().join("out/foo-0.1.0.zip");
        package(&spec(), dir.path(), &artifact).unwrap();
        assert!(artifact.is_file());
    }
}
