//! OS-package distribution via `fpm`
//!
//! The staging tree is the package filesystem root; packaging is fully
//! delegated to `fpm`, which in turn needs `rpmbuild`. Only linux/amd64
//! products may declare an RPM dist.

use slipway_builder::script;
use slipway_errors::{DistError, Result};
use slipway_events::EventSender;
use slipway_types::{OsArch, ProductSpec, RpmDistInfo};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Verify `fpm` and `rpmbuild` are on PATH
///
/// # Errors
///
/// Returns a missing-tool error with an installation hint.
pub fn check_preflight() -> Result<()> {
    if which::which("fpm").is_err() {
        return Err(DistError::MissingTool {
            tool: "fpm".to_string(),
            hint: "Install it with `gem install fpm`.".to_string(),
        }
        .into());
    }
    if which::which("rpmbuild").is_err() {
        return Err(DistError::MissingTool {
            tool: "rpmbuild".to_string(),
            hint: "Install the rpm (or rpm-build) package for your platform.".to_string(),
        }
        .into());
    }
    Ok(())
}

/// RPM dists require linux/amd64 as the sole build target
///
/// # Errors
///
/// Returns an error naming the product otherwise.
pub fn validate_targets(spec: &ProductSpec) -> Result<()> {
    let linux_amd64 = OsArch::new("linux", "amd64");
    if spec.config.build.os_archs.as_slice() == [linux_amd64] {
        Ok(())
    } else {
        Err(DistError::RequiresLinuxAmd64 {
            dist_type: "rpm".to_string(),
            product: spec.name.clone(),
        }
        .into())
    }
}

/// Package the staging tree into an RPM at `artifact`
///
/// Install hook scripts are written as temp files under the project
/// directory for `fpm` and removed afterwards, on success and on failure.
///
/// # Errors
///
/// Returns an error when a hook script cannot be written or `fpm` fails;
/// the captured `fpm` output is embedded.
pub async fn package(
    spec: &ProductSpec,
    info: &RpmDistInfo,
    staging_root: &Path,
    artifact: &Path,
    tx: &EventSender,
) -> Result<()> {
    let mut args: Vec<String> = vec![
        "-t".to_string(),
        "rpm".to_string(),
        "-n".to_string(),
        spec.name.clone(),
        "-v".to_string(),
        spec.version.clone(),
        "--iteration".to_string(),
        info.release.clone(),
        "-p".to_string(),
        artifact.display().to_string(),
        "-s".to_string(),
        "dir".to_string(),
        "-C".to_string(),
        staging_root.display().to_string(),
    ];
    for config_file in &info.config_files {
        args.push("--config-files".to_string());
        args.push(config_file.clone());
    }

    let hooks = [
        ("--before-install", &info.before_install_script),
        ("--after-install", &info.after_install_script),
        ("--after-remove", &info.after_remove_script),
    ];
    let mut hook_files: Vec<PathBuf> = Vec::new();
    let mut write_failure = None;
    for (flag, body) in hooks {
        if body.is_empty() {
            continue;
        }
        match script::write_script(&spec.project_dir, body).await {
            Ok(path) => {
                args.push(flag.to_string());
                args.push(path.display().to_string());
                hook_files.push(path);
            }
            Err(e) => {
                write_failure = Some(e);
                break;
            }
        }
    }

    let result = match write_failure {
        Some(e) => Err(e),
        None => run_fpm(&args).await,
    };
    for path in &hook_files {
        script::remove_script(path, tx).await;
    }
    result
}

async fn run_fpm(args: &[String]) -> Result<()> {
    tracing::debug!(?args, "running fpm");
    let output = Command::new("fpm")
        .args(args)
        .output()
        .await
        .map_err(|e| DistError::ToolFailed {
            tool: "fpm".to_string(),
            code: -1,
            output: e.to_string(),
        })?;
    if output.status.success() {
        return Ok(());
    }
    let mut combined = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(stderr.trim());
    }
    Err(DistError::ToolFailed {
        tool: "fpm".to_string(),
        code: output.status.code().unwrap_or(-1),
        output: combined,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::ProductConfig;
    use slipway_types::VersionInfo;
    use std::path::PathBuf;

    fn spec_with_targets(targets: Vec<OsArch>) -> ProductSpec {
        let mut config = ProductConfig::default();
        config.build.os_archs = targets;
        ProductSpec {
            project_dir: PathBuf::from("/project"),
            name: "foo".to_string(),
            version: "0.1.0".to_string(),
            version_info: VersionInfo::new("0.1.0", "0.1.0", "0"),
            config,
        }
    }

    #[test]
    fn linux_amd64_only_is_accepted() {
        let spec = spec_with_targets(vec![OsArch::new("linux", "amd64")]);
        validate_targets(&spec).unwrap();
    }

    #[test]
    fn other_target_sets_are_rejected() {
        let spec = spec_with_targets(vec![
            OsArch::new("linux", "amd64"),
            OsArch::new("darwin", "arm64"),
        ]);
        assert!(validate_targets(&spec).is_err());

        let spec = spec_with_targets(vec![OsArch::new("darwin", "arm64")]);
        assert!(validate_targets(&spec).is_err());
    }
}
