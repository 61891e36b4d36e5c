//! Streaming checksum computation for uploads
//!
//! Repository remotes compare and attach MD5, SHA-1 and SHA-256 digests, so
//! every artifact is hashed in all three formats in a single pass over the
//! file.

use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::Sha256;
use slipway_errors::Error;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming checksum computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Hex digests of one file, in every format remotes compare against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChecksums {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

/// Compute all three digests of `path` in one read pass
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub async fn compute(path: &Path) -> Result<FileChecksums, Error> {
    let mut file = File::open(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;

    let mut md5 = Md5::new();
    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut buffer = vec![0; CHUNK_SIZE];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        if n == 0 {
            break;
        }
        md5.update(&buffer[..n]);
        sha1.update(&buffer[..n]);
        sha256.update(&buffer[..n]);
    }

    Ok(FileChecksums {
        md5: hex::encode(md5.finalize()),
        sha1: hex::encode(sha1.finalize()),
        sha256: hex::encode(sha256.finalize()),
    })
}
