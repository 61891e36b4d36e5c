//! End-to-end dist assembly against real staging trees and archives

use slipway_dist::dist_product;
use slipway_types::{
    paths, BinDistInfo, DistConfig, DistType, ManualDistInfo, OsArch, ProductConfig, ProductSpec,
    PublishConfig, SlsDistInfo, SpecWithDeps, VersionInfo,
};
use std::collections::BTreeMap;
use std::path::Path;

fn make_spec(project_dir: &Path, dist: DistConfig) -> SpecWithDeps {
    let mut config = ProductConfig::default();
    config.build.os_archs = vec![OsArch::new("linux", "amd64")];
    config.dist = vec![dist];
    let spec = ProductSpec {
        project_dir: project_dir.to_path_buf(),
        name: "foo".to_string(),
        version: "1.0.0".to_string(),
        version_info: VersionInfo::new("1.0.0", "1.0.0", "0"),
        config,
    };
    SpecWithDeps::new(spec, &BTreeMap::new()).unwrap()
}

fn write_build_artifacts(with_deps: &SpecWithDeps) {
    for artifact in paths::build_artifacts(&with_deps.spec, &[]).values() {
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(artifact, b"binary").unwrap();
    }
}

fn sls_dist(group_id: &str, info: SlsDistInfo) -> DistConfig {
    DistConfig {
        dist_type: Some(DistType::Sls(info)),
        publish: PublishConfig {
            group_id: group_id.to_string(),
            ..PublishConfig::default()
        },
        ..DistConfig::default()
    }
}

#[cfg(unix)]
fn assert_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path).unwrap().permissions().mode();
    assert!(mode & 0o111 != 0, "{} is not executable", path.display());
}

#[cfg(not(unix))]
fn assert_executable(_path: &Path) {}

fn tgz_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    archive
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap().path().unwrap().display().to_string())
        .collect()
}

#[tokio::test]
async fn sls_dist_produces_manifest_init_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    let with_deps = make_spec(dir.path(), sls_dist("com.acme", SlsDistInfo::default()));
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    dist_product(&with_deps, &tx).await.unwrap();

    let staging = dir.path().join("dist/foo-1.0.0");
    let manifest = std::fs::read_to_string(staging.join("deployment/manifest.yml")).unwrap();
    assert_eq!(
        manifest,
        "manifest-version: \"1.0\"\n\
         product-group: com.acme\n\
         product-name: foo\n\
         product-version: 1.0.0\n"
    );
    assert_executable(&staging.join("service/bin/init.sh"));
    assert!(staging.join("service/bin/linux-amd64/foo").is_file());
    assert!(dir.path().join("dist/foo-1.0.0.sls.tgz").is_file());
}

#[tokio::test]
async fn sls_manifest_carries_product_type_and_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let info = SlsDistInfo {
        product_type: "service.v1".to_string(),
        manifest_extensions: [(
            "tier".to_string(),
            serde_yml::Value::String("bronze".to_string()),
        )]
        .into_iter()
        .collect(),
        ..SlsDistInfo::default()
    };
    let with_deps = make_spec(dir.path(), sls_dist("com.acme", info));
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    dist_product(&with_deps, &tx).await.unwrap();

    let manifest =
        std::fs::read_to_string(dir.path().join("dist/foo-1.0.0/deployment/manifest.yml"))
            .unwrap();
    assert!(manifest.contains("product-type: service.v1\n"));
    assert!(manifest.contains("extensions:\n  tier: bronze\n"));
}

#[tokio::test]
async fn missing_build_artifacts_fail_before_staging() {
    let dir = tempfile::tempdir().unwrap();
    let with_deps = make_spec(dir.path(), sls_dist("com.acme", SlsDistInfo::default()));

    let (tx, _rx) = slipway_events::channel();
    let err = dist_product(&with_deps, &tx).await.unwrap_err();
    assert!(err.to_string().contains("foo"));
    assert!(err.to_string().contains("run build first"));
    assert!(!dir.path().join("dist").exists());
}

#[tokio::test]
async fn dist_script_sees_documented_environment() {
    let dir = tempfile::tempdir().unwrap();
    let mut dist = sls_dist("com.acme", SlsDistInfo::default());
    dist.script = "echo \"$PRODUCT $VERSION $IS_SNAPSHOT\" > \"$DIST_DIR/env.txt\"".to_string();
    let with_deps = make_spec(dir.path(), dist);
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    dist_product(&with_deps, &tx).await.unwrap();

    let env = std::fs::read_to_string(dir.path().join("dist/foo-1.0.0/env.txt")).unwrap();
    assert_eq!(env, "foo 1.0.0 0\n");
    // the script ran before packaging, so its output is in the archive
    let entries = tgz_entries(&dir.path().join("dist/foo-1.0.0.sls.tgz"));
    assert!(entries.iter().any(|e| e == "foo-1.0.0/env.txt"));
}

#[tokio::test]
async fn input_dir_is_copied_without_gitkeep_markers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("static/var/log")).unwrap();
    std::fs::write(dir.path().join("static/var/log/.gitkeep"), b"").unwrap();
    std::fs::write(dir.path().join("static/README.md"), b"docs").unwrap();

    let mut dist = sls_dist("com.acme", SlsDistInfo::default());
    dist.input_dir = "static".to_string();
    let with_deps = make_spec(dir.path(), dist);
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    dist_product(&with_deps, &tx).await.unwrap();

    let staging = dir.path().join("dist/foo-1.0.0");
    assert!(staging.join("README.md").is_file());
    assert!(staging.join("var/log").is_dir());
    assert!(!staging.join("var/log/.gitkeep").exists());
}

#[tokio::test]
async fn bin_dist_stages_launcher_and_binaries() {
    let dir = tempfile::tempdir().unwrap();
    let dist = DistConfig {
        dist_type: Some(DistType::Bin(BinDistInfo::default())),
        ..DistConfig::default()
    };
    let with_deps = make_spec(dir.path(), dist);
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    dist_product(&with_deps, &tx).await.unwrap();

    let staging = dir.path().join("dist/foo-1.0.0");
    assert!(staging.join("bin/linux-amd64/foo").is_file());
    assert_executable(&staging.join("bin/foo.sh"));
    assert!(dir.path().join("dist/foo-1.0.0.tgz").is_file());
}

#[tokio::test]
async fn os_archs_bin_produces_one_archive_per_target() {
    let dir = tempfile::tempdir().unwrap();
    let mut with_deps = make_spec(dir.path(), DistConfig::default());
    with_deps.spec.config.build.os_archs = vec![
        OsArch::new("darwin", "amd64"),
        OsArch::new("linux", "amd64"),
    ];
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    dist_product(&with_deps, &tx).await.unwrap();

    let darwin = dir.path().join("dist/foo-1.0.0-darwin-amd64.tgz");
    let linux = dir.path().join("dist/foo-1.0.0-linux-amd64.tgz");
    assert!(darwin.is_file());
    assert!(linux.is_file());
    let entries = tgz_entries(&linux);
    assert!(entries.iter().any(|e| e == "foo-1.0.0-linux-amd64/foo"));
}

#[tokio::test]
async fn manual_dist_copies_the_script_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let dist = DistConfig {
        dist_type: Some(DistType::Manual(ManualDistInfo {
            extension: "zip".to_string(),
        })),
        script: "echo data > \"$DIST_DIR/foo-1.0.0.zip\"".to_string(),
        ..DistConfig::default()
    };
    let with_deps = make_spec(dir.path(), dist);
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    dist_product(&with_deps, &tx).await.unwrap();
    assert!(dir.path().join("dist/foo-1.0.0.zip").is_file());
}

#[tokio::test]
async fn manual_dist_without_artifact_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let dist = DistConfig {
        dist_type: Some(DistType::Manual(ManualDistInfo {
            extension: "zip".to_string(),
        })),
        ..DistConfig::default()
    };
    let with_deps = make_spec(dir.path(), dist);
    write_build_artifacts(&with_deps);

    let (tx, _rx) = slipway_events::channel();
    let err = dist_product(&with_deps, &tx).await.unwrap_err();
    assert!(err.to_string().contains("did not produce"));
}
