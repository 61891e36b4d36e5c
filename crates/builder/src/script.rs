//! User script execution
//!
//! Scripts are written to a file under the project directory with a bash
//! shebang and mode 0755, run as a subprocess with the caller's extra
//! environment, and removed afterwards whether the run succeeded or not.
//! A failed removal is reported as a warning, never as the script's result.

use slipway_errors::{BuildError, Result};
use slipway_events::{EventEmitter, EventSender};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::process::Command;

static SCRIPT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Run a script, streaming its output to the caller's stdout/stderr
///
/// # Errors
///
/// Returns an error if the script cannot be written or started, or exits
/// non-zero.
pub async fn run_script(
    project_dir: &Path,
    body: &str,
    env: &BTreeMap<String, String>,
    tx: &EventSender,
) -> Result<()> {
    let path = write_script(project_dir, body).await?;
    let result = Command::new(&path)
        .current_dir(project_dir)
        .envs(env)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await;
    remove_script(&path, tx).await;

    let status = result.map_err(|e| BuildError::ScriptExecFailed {
        message: e.to_string(),
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(BuildError::ScriptFailed {
            code: status.code().unwrap_or(-1),
        }
        .into())
    }
}

/// Run a script and capture its stdout, for scripts whose output feeds
/// back into the tool (build arguments)
///
/// # Errors
///
/// Returns an error if the script cannot be written or started, or exits
/// non-zero; the error message carries the script's stderr.
pub async fn script_output(
    project_dir: &Path,
    body: &str,
    env: &BTreeMap<String, String>,
    tx: &EventSender,
) -> Result<String> {
    let path = write_script(project_dir, body).await?;
    let result = Command::new(&path)
        .current_dir(project_dir)
        .envs(env)
        .output()
        .await;
    remove_script(&path, tx).await;

    let output = result.map_err(|e| BuildError::ScriptExecFailed {
        message: e.to_string(),
    })?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(BuildError::ScriptExecFailed {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into())
    }
}

/// Write a script body to an executable temp file under the project directory
///
/// Callers that invoke the file through another tool are responsible for
/// removing it afterwards via [`remove_script`].
///
/// # Errors
///
/// Returns an error if the file cannot be written or made executable.
pub async fn write_script(project_dir: &Path, body: &str) -> Result<PathBuf> {
    let seq = SCRIPT_SEQ.fetch_add(1, Ordering::Relaxed);
    let path = project_dir.join(format!(
        ".slipway-script-{}-{seq}.sh",
        std::process::id()
    ));
    let contents = format!("#!/bin/bash\n{body}\n");
    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| slipway_errors::Error::io_with_path(&e, &path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| slipway_errors::Error::io_with_path(&e, &path))?;
    }

    Ok(path)
}

/// Remove a script file, downgrading failure to a warning event
pub async fn remove_script(path: &Path, tx: &EventSender) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tx.emit_warning_with_context(
            format!("failed to remove script file {}", path.display()),
            e.to_string(),
        );
    }
}
