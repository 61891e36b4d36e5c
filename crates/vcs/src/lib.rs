#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Version derivation from source control
//!
//! Shells out to `git` in the project directory and derives the
//! version/branch/revision triple that drives artifact naming. The rules:
//!
//! - no tags: `unspecified`/`unspecified`/commit count from the first commit
//! - tagged: `git describe --tags --first-parent` with any leading `v`
//!   stripped, `.dirty` appended when the working tree has uncommitted or
//!   untracked changes; branch is the nearest first-parent tag; revision is
//!   the commit count from that tag to `HEAD`

mod git;

pub use git::GitRepo;

use slipway_errors::Result;
use slipway_types::VersionInfo;
use std::path::Path;

/// Derive the version triple for a project directory
///
/// # Errors
///
/// Returns an error if `git` cannot be run or the directory is not a
/// repository. Callers that tolerate unversioned projects substitute
/// [`VersionInfo::unspecified`] for the result.
pub async fn project_version_info(project_dir: &Path) -> Result<VersionInfo> {
    let repo = GitRepo::new(project_dir);

    if repo.tags().await?.is_empty() {
        let revision = repo.commit_count("HEAD").await?;
        return Ok(VersionInfo::new(
            slipway_types::UNSPECIFIED_VERSION,
            slipway_types::UNSPECIFIED_VERSION,
            revision,
        ));
    }

    let mut version = strip_v(&repo.describe().await?).to_string();
    if repo.is_dirty().await? {
        version.push_str(".dirty");
    }

    let branch = repo.nearest_tag().await?;
    let revision = repo.commit_count(&format!("{branch}..HEAD")).await?;
    Ok(VersionInfo::new(version, branch, revision))
}

fn strip_v(describe: &str) -> &str {
    describe.strip_prefix('v').unwrap_or(describe)
}

#[cfg(test)]
mod tests {
    use super::strip_v;

    #[test]
    fn leading_v_is_stripped() {
        assert_eq!(strip_v("v1.2.3"), "1.2.3");
        assert_eq!(strip_v("1.2.3"), "1.2.3");
    }
}
