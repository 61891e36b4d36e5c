//! Project version information derived from source control

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Version string used when the repository state cannot be determined
pub const UNSPECIFIED_VERSION: &str = "unspecified";

/// Version triple derived from the source-control state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Semantic version: nearest tag stripped of a leading `v`, with
    /// `.dirty` appended for a modified working tree
    pub version: String,
    /// Nearest tag reachable from HEAD on the first-parent ancestry
    pub branch: String,
    /// Count of commits between that tag and HEAD
    pub revision: String,
}

impl VersionInfo {
    pub fn new(
        version: impl Into<String>,
        branch: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            branch: branch.into(),
            revision: revision.into(),
        }
    }

    /// Version info for a repository whose state could not be read
    #[must_use]
    pub fn unspecified() -> Self {
        Self::new(UNSPECIFIED_VERSION, UNSPECIFIED_VERSION, "0")
    }

    /// Whether this version carries a commit-hash tail (non-release provenance)
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(&self.version)
    }

    /// Whether the version was derived from a dirty working tree
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.version.contains(".dirty")
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

fn snapshot_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r".+g[-+.]?[a-fA-F0-9]{3,}$").expect("snapshot regex is valid")
    })
}

/// Whether a version string's tail carries a commit-hash-like segment
#[must_use]
pub fn is_snapshot_version(version: &str) -> bool {
    snapshot_regex().is_match(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_predicate_matches_describe_output() {
        assert!(is_snapshot_version("0.1.0-2-g0f9fa0a"));
        assert!(is_snapshot_version("0.1.0-rc1-2-g0f9fa0a"));
    }

    #[test]
    fn snapshot_predicate_rejects_releases() {
        assert!(!is_snapshot_version("0.0.1"));
        assert!(!is_snapshot_version("0.0.1-rc1"));
        assert!(!is_snapshot_version("0.0.1-rc1.dirty"));
        assert!(!is_snapshot_version(UNSPECIFIED_VERSION));
    }

    #[test]
    fn dirty_versions_are_flagged() {
        let info = VersionInfo::new("0.0.1.dirty", "0.0.1", "0");
        assert!(info.is_dirty());
        assert!(!info.is_snapshot());
    }
}
