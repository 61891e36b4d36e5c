//! `go build` invocation for one (product, target) unit

use crate::pool::BuildOptions;
use crate::script;
use regex::Regex;
use slipway_errors::{BuildError, Result};
use slipway_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use slipway_types::{paths, OsArch, ProductSpec};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;
use tokio::process::Command;

/// Isolated per-target package cache used with `-pkgdir`:
/// `<projectDir>/<buildOutputDir>/pkg/<os>-<arch>`
#[must_use]
pub fn build_pkg_dir(spec: &ProductSpec, os_arch: &OsArch) -> PathBuf {
    paths::build_output_dir(spec)
        .join("pkg")
        .join(os_arch.to_string())
}

/// Compile one product for one target
///
/// Creates the artifact directory, optionally warms the package cache with
/// `go install`, runs the user's build-arguments script, and invokes
/// `go build` with the cross-compile environment. Captured toolchain output
/// is embedded in the error on failure.
///
/// # Errors
///
/// Returns an error if any script or toolchain invocation fails.
pub async fn build_unit(
    spec: &ProductSpec,
    os_arch: &OsArch,
    opts: &BuildOptions,
    tx: &EventSender,
) -> Result<()> {
    let artifact = paths::build_artifact_path(spec, os_arch);
    let started = Instant::now();
    tx.emit(AppEvent::Build(BuildEvent::UnitStarted {
        product: spec.name.clone(),
        os_arch: os_arch.clone(),
        path: artifact.clone(),
    }));

    let dir = paths::build_artifact_dir(spec, os_arch);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| slipway_errors::Error::io_with_path(&e, &dir))?;

    if opts.install_first {
        run_go(spec, os_arch, &["install", &spec.config.build.main_pkg], |message| {
            BuildError::InstallFailed {
                product: spec.name.clone(),
                os_arch: os_arch.to_string(),
                message,
            }
        })
        .await?;
    }

    let mut args: Vec<String> = vec![
        "build".to_string(),
        "-o".to_string(),
        artifact.display().to_string(),
    ];
    args.extend(script_args(spec, tx).await?);
    if !spec.config.build.version_var.is_empty() {
        args.push("-ldflags".to_string());
        args.push(format!(
            "-X {}={}",
            spec.config.build.version_var, spec.version
        ));
    }
    if opts.isolated_pkg_dir {
        args.push("-pkgdir".to_string());
        args.push(build_pkg_dir(spec, os_arch).display().to_string());
    }
    args.push(spec.config.build.main_pkg.clone());

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    run_go(spec, os_arch, &arg_refs, |message| BuildError::CompileFailed {
        product: spec.name.clone(),
        os_arch: os_arch.to_string(),
        message,
    })
    .await?;

    tx.emit(AppEvent::Build(BuildEvent::UnitCompleted {
        product: spec.name.clone(),
        os_arch: os_arch.clone(),
        duration: started.elapsed(),
    }));
    Ok(())
}

/// Build-argument script stdout lines, one flag per non-empty line
async fn script_args(spec: &ProductSpec, tx: &EventSender) -> Result<Vec<String>> {
    if spec.config.build.build_args_script.is_empty() {
        return Ok(Vec::new());
    }
    let output = script::script_output(
        &spec.project_dir,
        &spec.config.build.build_args_script,
        &spec.config.build.environment,
        tx,
    )
    .await?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

async fn run_go<F>(
    spec: &ProductSpec,
    os_arch: &OsArch,
    args: &[&str],
    to_error: F,
) -> Result<()>
where
    F: Fn(String) -> BuildError,
{
    tracing::debug!(?args, os_arch = %os_arch, "running go");
    let output = Command::new("go")
        .args(args)
        .current_dir(&spec.project_dir)
        .env("GOOS", &os_arch.os)
        .env("GOARCH", &os_arch.arch)
        .envs(&spec.config.build.environment)
        .output()
        .await
        .map_err(|e| to_error(format!("failed to run go: {e}")))?;

    if output.status.success() {
        return Ok(());
    }

    let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
    message.push_str(&String::from_utf8_lossy(&output.stderr));
    let message = message.trim().to_string();

    if stdlib_permission_denied(&message) {
        return Err(BuildError::StdlibCacheNotWritable {
            os_arch: os_arch.to_string(),
            suggested: format!(
                "sudo env GOOS={} GOARCH={} go install std",
                os_arch.os, os_arch.arch
            ),
            underlying: message,
        }
        .into());
    }

    Err(to_error(message).into())
}

/// Matches the toolchain's complaint when a cross-compiled standard
/// library cannot be written to the shared cache
fn stdlib_permission_denied(message: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^go install [^:]+: mkdir .+: permission denied$")
            .expect("permission regex is valid")
    });
    re.is_match(message)
}
