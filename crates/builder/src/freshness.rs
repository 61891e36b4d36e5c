//! Source-freshness checking of build artifacts
//!
//! Decides, per (product, target), whether the build artifact is older than
//! any file in the product's transitive source set. Transitive means
//! following non-standard-library imports through `vendor/` and
//! module-local packages; test files and cgo files are not part of what
//! gets built, so they never count.

use slipway_specs::gosrc;
use slipway_types::{paths, OsArch, ProductSpec, SpecWithDeps};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why a (product, target) needs rebuilding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// The expected artifact does not exist
    MissingArtifact,
    /// A source file is at least as new as the artifact
    StaleSource { source: PathBuf },
    /// The check itself failed; rebuilding is the safe answer
    CheckFailed { message: String },
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArtifact => write!(f, "artifact does not exist"),
            Self::StaleSource { source } => {
                write!(f, "source {} is newer than the artifact", source.display())
            }
            Self::CheckFailed { message } => write!(f, "freshness check failed: {message}"),
        }
    }
}

/// Status of one examined (product, target)
#[derive(Debug, Clone)]
pub struct UnitStatus {
    pub product: String,
    pub os_arch: OsArch,
    /// `None` when the artifact is fresh
    pub reason: Option<StaleReason>,
}

/// Requires-build results, addressable by (product, target) and
/// enumerable in examination order
#[derive(Debug, Default)]
pub struct RequiresBuild {
    units: Vec<UnitStatus>,
}

impl RequiresBuild {
    /// Whether a (product, target) needs building
    ///
    /// Pairs that were never examined require a build by contract.
    #[must_use]
    pub fn requires_build(&self, product: &str, os_arch: &OsArch) -> bool {
        self.status(product, os_arch)
            .map_or(true, |unit| unit.reason.is_some())
    }

    /// Reason a (product, target) needs building, if it does
    #[must_use]
    pub fn reason(&self, product: &str, os_arch: &OsArch) -> Option<&StaleReason> {
        self.status(product, os_arch)
            .and_then(|unit| unit.reason.as_ref())
    }

    /// Every examined unit, in examination order
    #[must_use]
    pub fn units(&self) -> &[UnitStatus] {
        &self.units
    }

    /// Examined units that need building, in examination order
    pub fn stale_units(&self) -> impl Iterator<Item = &UnitStatus> {
        self.units.iter().filter(|unit| unit.reason.is_some())
    }

    /// Targets of one product that need building, in examination order
    #[must_use]
    pub fn stale_targets(&self, product: &str) -> Vec<OsArch> {
        self.stale_units()
            .filter(|unit| unit.product == product)
            .map(|unit| unit.os_arch.clone())
            .collect()
    }

    fn status(&self, product: &str, os_arch: &OsArch) -> Option<&UnitStatus> {
        self.units
            .iter()
            .find(|unit| unit.product == product && &unit.os_arch == os_arch)
    }
}

/// Examine every (product, target) in `specs` matching the filter
///
/// Dist input products are examined along with the product that names
/// them, so the result covers everything a subsequent dist would need.
/// Products whose build is skipped have no artifacts and are not
/// examined.
#[must_use]
pub fn check(specs: &[SpecWithDeps], filter: &[OsArch]) -> RequiresBuild {
    let mut result = RequiresBuild::default();
    let mut seen = HashSet::new();
    for with_deps in specs {
        for spec in std::iter::once(&with_deps.spec).chain(with_deps.deps.values()) {
            if !seen.insert(spec.name.clone()) {
                continue;
            }
            if spec.config.build.skip {
                continue;
            }
            let sources = collect_sources(spec);
            for os_arch in &spec.config.build.os_archs {
                if !filter.is_empty() && !filter.contains(os_arch) {
                    continue;
                }
                let reason = match &sources {
                    Ok(files) => artifact_reason(spec, os_arch, files),
                    Err(message) => Some(StaleReason::CheckFailed {
                        message: message.clone(),
                    }),
                };
                result.units.push(UnitStatus {
                    product: spec.name.clone(),
                    os_arch: os_arch.clone(),
                    reason,
                });
            }
        }
    }
    result
}

fn artifact_reason(
    spec: &ProductSpec,
    os_arch: &OsArch,
    sources: &[PathBuf],
) -> Option<StaleReason> {
    let artifact = paths::build_artifact_path(spec, os_arch);
    let artifact_mtime = match mtime(&artifact) {
        Ok(Some(t)) => t,
        Ok(None) => return Some(StaleReason::MissingArtifact),
        Err(message) => return Some(StaleReason::CheckFailed { message }),
    };

    for source in sources {
        match mtime(source) {
            // the artifact must be strictly newer than every source
            Ok(Some(t)) if t >= artifact_mtime => {
                return Some(StaleReason::StaleSource {
                    source: source.clone(),
                });
            }
            Ok(_) => {}
            Err(message) => return Some(StaleReason::CheckFailed { message }),
        }
    }
    None
}

fn mtime(path: &Path) -> Result<Option<SystemTime>, String> {
    match std::fs::metadata(path) {
        Ok(meta) => meta
            .modified()
            .map(Some)
            .map_err(|e| format!("{}: {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("{}: {e}", path.display())),
    }
}

/// Transitive non-standard-library source files of a product's main package
fn collect_sources(spec: &ProductSpec) -> Result<Vec<PathBuf>, String> {
    let project_dir = &spec.project_dir;
    let module = module_path(project_dir);

    let start = package_dir(project_dir, &spec.config.build.main_pkg);
    let mut queue: VecDeque<PathBuf> = VecDeque::from([start]);
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    while let Some(dir) = queue.pop_front() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| format!("{}: {e}", dir.display()))?;
        for entry in entries {
            let entry = entry.map_err(|e| format!("{}: {e}", dir.display()))?;
            let path = entry.path();
            if !path.is_file() || !gosrc::is_go_file(&path) || gosrc::is_test_file(&path) {
                continue;
            }
            let content =
                std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))?;
            let source = gosrc::parse(&content);
            if source.uses_cgo() {
                continue;
            }
            for import in &source.imports {
                if gosrc::is_stdlib_import(import) {
                    continue;
                }
                if let Some(next) = resolve_import(project_dir, module.as_deref(), import) {
                    if !visited.contains(&next) {
                        queue.push_back(next);
                    }
                }
            }
            files.push(path);
        }
    }
    Ok(files)
}

fn package_dir(project_dir: &Path, main_pkg: &str) -> PathBuf {
    let rel = main_pkg.trim_start_matches("./");
    if rel.is_empty() || rel == "." {
        project_dir.to_path_buf()
    } else {
        project_dir.join(rel)
    }
}

/// Map an import path to a directory inside the project, if it is one
///
/// `vendor/<path>` wins over module-local resolution; imports outside both
/// are external modules and considered stable.
fn resolve_import(project_dir: &Path, module: Option<&str>, import: &str) -> Option<PathBuf> {
    let vendored = project_dir.join("vendor").join(import);
    if vendored.is_dir() {
        return Some(vendored);
    }
    let module = module?;
    if import == module {
        return Some(project_dir.to_path_buf());
    }
    let rest = import.strip_prefix(module)?.strip_prefix('/')?;
    let local = project_dir.join(rest);
    local.is_dir().then_some(local)
}

fn module_path(project_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(project_dir.join("go.mod")).ok()?;
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("module "))
        .map(|rest| rest.trim().to_string())
}
