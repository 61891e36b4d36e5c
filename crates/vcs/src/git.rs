//! Thin adapter over the `git` command line

use slipway_errors::{Result, VcsError};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// A git repository rooted at a directory
#[derive(Debug, Clone)]
pub struct GitRepo {
    dir: PathBuf,
}

impl GitRepo {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Repository root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All tag names, one per line from `git tag`
    ///
    /// # Errors
    ///
    /// Returns an error if `git` cannot be run or exits non-zero.
    pub async fn tags(&self) -> Result<Vec<String>> {
        let out = self.run(&["tag"]).await?;
        Ok(out.lines().map(ToString::to_string).collect())
    }

    /// `git describe --tags --first-parent`
    ///
    /// # Errors
    ///
    /// Returns an error if `git` cannot be run or exits non-zero.
    pub async fn describe(&self) -> Result<String> {
        self.run(&["describe", "--tags", "--first-parent"]).await
    }

    /// Nearest tag reachable from `HEAD` along first parents
    ///
    /// # Errors
    ///
    /// Returns an error if `git` cannot be run or exits non-zero.
    pub async fn nearest_tag(&self) -> Result<String> {
        self.run(&["describe", "--tags", "--abbrev=0", "--first-parent"])
            .await
    }

    /// Whether the working tree has uncommitted or untracked changes
    ///
    /// # Errors
    ///
    /// Returns an error if `git` cannot be run or exits non-zero.
    pub async fn is_dirty(&self) -> Result<bool> {
        let out = self.run(&["status", "--porcelain"]).await?;
        Ok(!out.is_empty())
    }

    /// Commit count for a revision range, e.g. `HEAD` or `<tag>..HEAD`
    ///
    /// # Errors
    ///
    /// Returns an error if `git` cannot be run or exits non-zero.
    pub async fn commit_count(&self, range: &str) -> Result<String> {
        self.run(&["rev-list", "--count", range]).await
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()
            .await
            .map_err(|e| VcsError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(VcsError::NonZeroExit {
                command: format!("git {}", args.join(" ")),
                code: output.status.code().unwrap_or(-1),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
