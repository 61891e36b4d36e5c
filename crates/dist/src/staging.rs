//! Staging tree preparation

use slipway_errors::{Error, Result};
use std::path::Path;

/// Remove and recreate a staging root
///
/// # Errors
///
/// Returns an error if the existing directory cannot be removed or the
/// new one cannot be created.
pub fn recreate(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| Error::io_with_path(&e, dir))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::io_with_path(&e, dir))?;
    Ok(())
}

/// Recursively copy the contents of `src` into `dest`
///
/// Files literally named `.gitkeep` are not copied; the directories
/// holding them are, so empty directories survive the copy.
///
/// # Errors
///
/// Returns an error with path context on any read or write failure.
pub fn copy_contents(src: &Path, dest: &Path) -> Result<()> {
    let entries = std::fs::read_dir(src).map_err(|e| Error::io_with_path(&e, src))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io_with_path(&e, src))?;
        let path = entry.path();
        let target = dest.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| Error::io_with_path(&e, &path))?;
        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| Error::io_with_path(&e, &target))?;
            copy_contents(&path, &target)?;
        } else {
            if entry.file_name() == ".gitkeep" {
                continue;
            }
            copy_file(&path, &target)?;
        }
    }
    Ok(())
}

/// Copy one file, creating parent directories as needed
///
/// # Errors
///
/// Returns an error with path context on any write failure.
pub fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(&e, parent))?;
    }
    std::fs::copy(src, dest).map_err(|e| Error::io_with_path(&e, src))?;
    Ok(())
}

/// Copy one file and mark it executable
///
/// # Errors
///
/// Returns an error with path context on any write failure.
pub fn copy_executable(src: &Path, dest: &Path) -> Result<()> {
    copy_file(src, dest)?;
    make_executable(dest)
}

/// Set mode 0755 on a path
///
/// # Errors
///
/// Returns an error if permissions cannot be changed.
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::io_with_path(&e, path))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recreate_clears_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("work");
        std::fs::create_dir_all(staging.join("old")).unwrap();
        std::fs::write(staging.join("old/file"), "stale").unwrap();

        recreate(&staging).unwrap();
        assert!(staging.is_dir());
        assert!(!staging.join("old").exists());
    }

    #[test]
    fn copy_skips_gitkeep_but_keeps_directories() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("input");
        std::fs::create_dir_all(src.join("var/log")).unwrap();
        std::fs::write(src.join("var/log/.gitkeep"), "").unwrap();
        std::fs::write(src.join("conf.yml"), "key: value\n").unwrap();

        let dest = dir.path().join("staging");
        std::fs::create_dir_all(&dest).unwrap();
        copy_contents(&src, &dest).unwrap();

        assert!(dest.join("var/log").is_dir());
        assert!(!dest.join("var/log/.gitkeep").exists());
        assert_eq!(
            std::fs::read_to_string(dest.join("conf.yml")).unwrap(),
            "key: value\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn copied_executables_are_0755() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bin");
        std::fs::write(&src, "#!/bin/bash\n").unwrap();

        let dest = dir.path().join("out/bin");
        copy_executable(&src, &dest).unwrap();
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
