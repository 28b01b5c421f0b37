//! Filesystem helpers
//!
//! Directory walking and copying with errors that name the path involved.

use crate::error::{Result, ResultExt};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List regular files under `root`, relative to it, in sorted order.
///
/// Symlinks are followed so that linked artifacts are copied as files.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry.context(format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    Ok(files)
}

/// Create a directory and its parents if missing
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).context(format!("Failed to create directory {}", path.display()))
}

/// Copy one file, creating the destination's parent and overwriting any
/// existing file. Returns the number of bytes copied.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    std::fs::copy(from, to).context(format!(
        "Failed to copy {} to {}",
        from.display(),
        to.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_list_files_sorted_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.apk"), "b").unwrap();
        std::fs::write(dir.path().join("a.apk"), "a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.sha1"), "c").unwrap();

        let files = list_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.apk"),
                PathBuf::from("b.apk"),
                PathBuf::from("nested").join("c.sha1"),
            ]
        );
    }

    #[test]
    fn test_list_files_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_copy_file_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app-release.apk");
        let dest = dir.path().join("out/deep/app-release.apk");
        std::fs::write(&src, "new").unwrap();

        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, "old contents").unwrap();

        let bytes = copy_file(&src, &dest).unwrap();
        assert_eq!(bytes, 3);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_file(&dir.path().join("missing.apk"), &dir.path().join("x.apk")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.unwrap().contains("missing.apk"));
    }
}
