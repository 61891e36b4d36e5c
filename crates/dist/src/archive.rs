//! Gzip tarball creation
//!
//! Archives a staging directory so the tarball's single top-level entry
//! is the directory itself, under a caller-chosen name.

use flate2::write::GzEncoder;
use flate2::Compression;
use slipway_errors::{DistError, Error, Result};
use std::path::Path;

/// Create a `.tgz` of `src_dir` at `dest` whose top-level entry is
/// `entry_name`
///
/// # Errors
///
/// Returns an error if the destination cannot be written or archiving
/// fails.
pub async fn create_tgz(src_dir: &Path, entry_name: &str, dest: &Path) -> Result<()> {
    let src = src_dir.to_path_buf();
    let entry = entry_name.to_string();
    let dest_path = dest.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::create(&dest_path)
            .map_err(|e| Error::io_with_path(&e, &dest_path))?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);
        builder
            .append_dir_all(&entry, &src)
            .map_err(|e| archive_failed(&dest_path, &e))?;
        let encoder = builder
            .into_inner()
            .map_err(|e| archive_failed(&dest_path, &e))?;
        encoder
            .finish()
            .map_err(|e| archive_failed(&dest_path, &e))?;
        Ok(())
    })
    .await
    .map_err(|e| {
        Error::from(DistError::ArchiveFailed {
            path: dest.display().to_string(),
            message: format!("archive task failed: {e}"),
        })
    })??;
    Ok(())
}

fn archive_failed(dest: &Path, err: &std::io::Error) -> Error {
    DistError::ArchiveFailed {
        path: dest.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    #[tokio::test]
    async fn tarball_top_level_entry_is_the_given_name() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("foo-0.1.0");
        std::fs::create_dir_all(staging.join("bin")).unwrap();
        std::fs::write(staging.join("bin/foo"), "binary").unwrap();

        let dest = dir.path().join("foo-0.1.0.tgz");
        create_tgz(&staging, "foo-0.1.0", &dest).await.unwrap();

        let file = std::fs::File::open(&dest).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect();
        assert!(names.contains(&"foo-0.1.0".to_string()));
        assert!(names.contains(&"foo-0.1.0/bin/foo".to_string()));
    }
}
