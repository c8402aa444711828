//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

/// Recursively list regular files under `dir`, sorted, skipping dot-entries.
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// List the non-hidden children of `dir`, which must all be directories.
///
/// Symlinks are followed by `metadata` but not resolved in the returned paths.
pub fn child_directories(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to open dependency directory '{}'", dir.display()))?;

    let mut children = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", dir.display()))?;
        if is_hidden(&entry.file_name()) {
            continue;
        }

        let path = entry.path();
        let metadata = fs::metadata(&path)
            .with_context(|| format!("failed to stat dependency '{}'", path.display()))?;
        if !metadata.is_dir() {
            bail!("'{}' is not a directory", path.display());
        }
        children.push(path);
    }

    children.sort();
    Ok(children)
}

/// Fail unless `path` exists and is a directory.
pub fn require_dir(path: &Path) -> Result<()> {
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to stat '{}'", path.display()))?;
    if !metadata.is_dir() {
        bail!("'{}' is not a directory", path.display());
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    if base.as_os_str().is_empty() {
        return path.to_path_buf();
    }
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_recursive_and_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sys")).unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join("stdio.h"), "").unwrap();
        fs::write(tmp.path().join("sys/types.h"), "").unwrap();
        fs::write(tmp.path().join(".hidden.h"), "").unwrap();
        fs::write(tmp.path().join(".git/config"), "").unwrap();

        let files = collect_files(tmp.path()).unwrap();
        assert_eq!(
            files,
            [tmp.path().join("stdio.h"), tmp.path().join("sys/types.h")]
        );
    }

    #[test]
    fn test_child_directories_rejects_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("kernel")).unwrap();
        fs::write(tmp.path().join("stray.txt"), "").unwrap();

        let err = child_directories(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_child_directories_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = child_directories(&tmp.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("failed to open dependency directory"));
    }

    #[test]
    fn test_require_dir() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, "").unwrap();

        assert!(require_dir(tmp.path()).is_ok());
        assert!(require_dir(&file).is_err());
        assert!(require_dir(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/top"), Path::new("/top/include/a.h")),
            PathBuf::from("include/a.h")
        );
        assert_eq!(
            relative_path(Path::new(""), Path::new("/top/a.h")),
            PathBuf::from("/top/a.h")
        );
    }
}
