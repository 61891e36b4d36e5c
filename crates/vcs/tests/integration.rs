//! Integration tests for version derivation against real git repositories

use slipway_types::{is_snapshot_version, UNSPECIFIED_VERSION};
use slipway_vcs::project_version_info;
use std::path::Path;
use std::process::Command;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=tester",
            "-c",
            "user.email=tester@localhost",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git runs");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    std::fs::write(dir.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "initial"]);
}

#[tokio::test]
async fn tagged_clean_repo() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    git(dir.path(), &["tag", "0.0.1"]);

    let info = project_version_info(dir.path()).await.unwrap();
    assert_eq!(info.version, "0.0.1");
    assert_eq!(info.branch, "0.0.1");
    assert_eq!(info.revision, "0");
    assert!(!info.is_snapshot());
    assert!(!info.is_dirty());
}

#[tokio::test]
async fn v_prefixed_tag_is_stripped() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    git(dir.path(), &["tag", "v1.2.0"]);

    let info = project_version_info(dir.path()).await.unwrap();
    assert_eq!(info.version, "1.2.0");
}

#[tokio::test]
async fn commit_after_tag_yields_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    git(dir.path(), &["tag", "0.0.1"]);
    std::fs::write(dir.path().join("other.go"), "package main\n").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "second"]);

    let info = project_version_info(dir.path()).await.unwrap();
    assert!(
        is_snapshot_version(&info.version),
        "expected snapshot, got {}",
        info.version
    );
    assert!(info.version.starts_with("0.0.1-1-g"));
    assert_eq!(info.branch, "0.0.1");
    assert_eq!(info.revision, "1");
}

#[tokio::test]
async fn untracked_file_marks_dirty() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    git(dir.path(), &["tag", "0.0.1"]);
    std::fs::write(dir.path().join("scratch.txt"), "wip").unwrap();

    let info = project_version_info(dir.path()).await.unwrap();
    assert_eq!(info.version, "0.0.1.dirty");
    assert!(info.is_dirty());
    assert!(!is_snapshot_version(&info.version));
}

#[tokio::test]
async fn untagged_repo_is_unspecified() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let info = project_version_info(dir.path()).await.unwrap();
    assert_eq!(info.version, UNSPECIFIED_VERSION);
    assert_eq!(info.branch, UNSPECIFIED_VERSION);
    assert_eq!(info.revision, "1");
}

#[tokio::test]
async fn non_repository_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(project_version_info(dir.path()).await.is_err());
}
