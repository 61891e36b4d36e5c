//! Run a product's main package in place, without building an artifact

use slipway_errors::{BuildError, Error, Result};
use slipway_specs::gosrc;
use slipway_types::ProductSpec;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Execute `go run` for the product's main package
///
/// The invocation receives every non-test `package main` file in the main
/// package directory, then the configured run arguments, then
/// `extra_args` from the command line. A literal `flag:` prefix on an
/// extra argument is stripped so flags destined for the program survive
/// the caller's own argument parsing. Standard streams are inherited.
///
/// # Errors
///
/// Returns an error if no file in the main package declares a `main`
/// function, if more than one does, or if the compiler driver cannot be
/// spawned.
pub async fn run_product(spec: &ProductSpec, extra_args: &[String]) -> Result<i32> {
    let pkg_dir = package_dir(spec);
    let (files, mains) = main_package_files(&pkg_dir)?;
    if mains.is_empty() {
        return Err(BuildError::NoMainFiles {
            path: pkg_dir.display().to_string(),
        }
        .into());
    }
    if mains.len() > 1 {
        return Err(BuildError::MultipleMainFiles {
            path: pkg_dir.display().to_string(),
            candidates: mains,
        }
        .into());
    }

    let mut args: Vec<String> = vec!["run".to_string()];
    args.extend(files.iter().map(|f| f.display().to_string()));
    args.extend(spec.config.run.args.iter().cloned());
    args.extend(extra_args.iter().map(|a| strip_flag_prefix(a).to_string()));

    let status = Command::new("go")
        .args(&args)
        .current_dir(&spec.project_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| BuildError::RunFailed {
            message: e.to_string(),
        })?;
    Ok(status.code().unwrap_or(1))
}

fn strip_flag_prefix(arg: &str) -> &str {
    arg.strip_prefix("flag:").unwrap_or(arg)
}

fn package_dir(spec: &ProductSpec) -> PathBuf {
    let rel = spec.config.build.main_pkg.trim_start_matches("./");
    if rel.is_empty() || rel == "." {
        spec.project_dir.clone()
    } else {
        spec.project_dir.join(rel)
    }
}

/// Non-test `package main` files of a directory, plus the subset that
/// declares a `main` function, both in path order
fn main_package_files(dir: &Path) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| Error::io_with_path(&e, dir))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut files = Vec::new();
    let mut mains = Vec::new();
    for path in paths {
        if !gosrc::is_go_file(&path) || gosrc::is_test_file(&path) {
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(&e, &path))?;
        let source = gosrc::parse(&content);
        if source.package != "main" {
            continue;
        }
        if source.has_main_func {
            mains.push(path.display().to_string());
        }
        files.push(path);
    }
    Ok((files, mains))
}
