//! Main-package auto-discovery for unconfigured projects

use crate::gosrc;
use slipway_config::ExcludeMatcher;
use slipway_errors::{Result, SpecError};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// A main package found under the project directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredProduct {
    /// Product name, the containing directory's basename
    pub name: String,
    /// Main package directory relative to the project root, `.` for the
    /// root itself
    pub main_pkg: String,
}

/// Enumerate directories under `project_dir` holding a `main` package
///
/// `vendor` trees, hidden directories, test files, and anything matched by
/// the exclusion matcher are skipped. Results are sorted by name; when two
/// directories share a basename the lexicographically first path wins.
///
/// # Errors
///
/// Returns an error if the project directory cannot be walked.
pub fn discover_main_packages(
    project_dir: &Path,
    matcher: &ExcludeMatcher,
) -> Result<Vec<DiscoveredProduct>> {
    let mut found: BTreeMap<String, String> = BTreeMap::new();

    for entry in WalkDir::new(project_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !skip_dir(project_dir, e))
    {
        let entry = entry.map_err(|e| SpecError::DiscoveryFailed {
            path: project_dir.display().to_string(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file()
            || !gosrc::is_go_file(entry.path())
            || gosrc::is_test_file(entry.path())
        {
            continue;
        }

        let content = std::fs::read_to_string(entry.path()).map_err(|e| {
            SpecError::DiscoveryFailed {
                path: entry.path().display().to_string(),
                message: e.to_string(),
            }
        })?;
        if gosrc::parse(&content).package != "main" {
            continue;
        }

        let dir = entry.path().parent().unwrap_or(project_dir);
        let rel = dir.strip_prefix(project_dir).unwrap_or(dir);
        if !rel.as_os_str().is_empty() && matcher.matches_path(rel) {
            continue;
        }
        let name = product_name(project_dir, dir);
        found.entry(name).or_insert_with(|| main_pkg_path(rel));
    }

    Ok(found
        .into_iter()
        .map(|(name, main_pkg)| DiscoveredProduct { name, main_pkg })
        .collect())
}

fn skip_dir(project_dir: &Path, entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() || entry.path() == project_dir {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name == "vendor" || name.starts_with('.'))
}

fn main_pkg_path(rel: &Path) -> String {
    if rel.as_os_str().is_empty() {
        ".".to_string()
    } else {
        format!("./{}", rel.display())
    }
}

fn product_name(project_dir: &Path, dir: &Path) -> String {
    let named = if dir == project_dir { project_dir } else { dir };
    named
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("project")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::ExcludeConfig;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn empty_matcher() -> ExcludeMatcher {
        ExcludeMatcher::new(&ExcludeConfig::default()).unwrap()
    }

    #[test]
    fn finds_main_packages_and_names_them_by_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cmd/server/main.go"),
            "package main\n\nfunc main() {}\n",
        );
        write(
            &dir.path().join("cmd/agent/main.go"),
            "package main\n\nfunc main() {}\n",
        );
        write(&dir.path().join("internal/lib.go"), "package internal\n");
        write(
            &dir.path().join("vendor/dep/main.go"),
            "package main\n\nfunc main() {}\n",
        );

        let found = discover_main_packages(dir.path(), &empty_matcher()).unwrap();
        assert_eq!(
            found,
            vec![
                DiscoveredProduct {
                    name: "agent".to_string(),
                    main_pkg: "./cmd/agent".to_string(),
                },
                DiscoveredProduct {
                    name: "server".to_string(),
                    main_pkg: "./cmd/server".to_string(),
                },
            ]
        );
    }

    #[test]
    fn root_package_takes_the_project_name() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("main.go"),
            "package main\n\nfunc main() {}\n",
        );

        let found = discover_main_packages(dir.path(), &empty_matcher()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].main_pkg, ".");
        assert_eq!(
            found[0].name,
            dir.path().file_name().unwrap().to_str().unwrap()
        );
    }

    #[test]
    fn excluded_paths_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cmd/server/main.go"),
            "package main\n\nfunc main() {}\n",
        );
        write(
            &dir.path().join("integration/main.go"),
            "package main\n\nfunc main() {}\n",
        );

        let matcher = ExcludeMatcher::new(&ExcludeConfig {
            names: Vec::new(),
            paths: vec!["integration".to_string()],
        })
        .unwrap();
        let found = discover_main_packages(dir.path(), &matcher).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "server");
    }

    #[test]
    fn test_files_do_not_create_products() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("tools/main_test.go"),
            "package main\n\nfunc main() {}\n",
        );

        let found = discover_main_packages(dir.path(), &empty_matcher()).unwrap();
        assert!(found.is_empty());
    }
}
