//! Test discovery - enumerate candidate unit files under the given roots

use anyhow::{bail, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names skipped at every depth unless configured otherwise
pub const DEFAULT_IGNORED: &[&str] = &["__pycache__", ".git", "target", "node_modules"];

/// Recursive file enumerator with an ignore list of directory names
#[derive(Debug, Clone)]
pub struct PathWalker {
    ignored: Vec<String>,
}

impl Default for PathWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl PathWalker {
    /// Create a walker with the default ignore list
    pub fn new() -> Self {
        Self {
            ignored: DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Skip additional directory names
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    /// Check if a directory base name is on the ignore list
    pub fn is_ignored(&self, name: &OsStr) -> bool {
        self.ignored.iter().any(|ignored| OsStr::new(ignored) == name)
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        !(entry.file_type().is_dir() && self.is_ignored(entry.file_name()))
    }

    /// Enumerate every file under `roots`, in root order
    ///
    /// Files inside a directory come out in the order the filesystem lists
    /// them. A missing root is an error; unreadable subtrees are logged and
    /// skipped.
    pub fn walk(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for root in roots {
            if !root.exists() {
                bail!("path not found: {}", root.display());
            }
            self.walk_root(root, &mut files);
        }

        tracing::debug!(files = files.len(), "discovery finished");
        Ok(files)
    }

    fn walk_root(&self, root: &Path, files: &mut Vec<PathBuf>) {
        let entries = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| self.keep(entry));

        for entry in entries {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {}
                Ok(entry) => files.push(entry.into_path()),
                Err(e) => {
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    tracing::warn!(%path, error = %e, "skipping unreadable path");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort();
        paths
    }

    #[test]
    fn test_walk_yields_all_files_recursively() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("test_a.tl"));
        touch(&root.join("README.md"));
        touch(&root.join("nested/deeper/test_b.tl"));

        let files = PathWalker::new().walk(&[root.to_path_buf()]).unwrap();
        assert_eq!(
            sorted(files),
            vec![
                root.join("README.md"),
                root.join("nested/deeper/test_b.tl"),
                root.join("test_a.tl"),
            ]
        );
    }

    #[test]
    fn test_ignored_names_skipped_at_any_depth() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("__pycache__/test_cached.tl"));
        touch(&root.join("pkg/node_modules/test_dep.tl"));
        touch(&root.join("pkg/.git/test_hook.tl"));
        touch(&root.join("pkg/test_real.tl"));

        let files = PathWalker::new().walk(&[root.to_path_buf()]).unwrap();
        assert_eq!(files, vec![root.join("pkg/test_real.tl")]);
    }

    #[test]
    fn test_ignored_root_yields_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        touch(&target.join("test_a.tl"));

        let files = PathWalker::new().walk(&[target]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_extra_ignored_names() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("fixtures/test_a.tl"));
        touch(&root.join("test_b.tl"));

        let walker = PathWalker::new().with_ignored(["fixtures"]);
        let files = walker.walk(&[root.to_path_buf()]).unwrap();
        assert_eq!(files, vec![root.join("test_b.tl")]);
    }

    #[test]
    fn test_file_root_is_yielded_directly() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("test_one.tl");
        touch(&file);
        touch(&dir.path().join("test_other.tl"));

        let files = PathWalker::new().walk(&[file.clone()]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_same_root_twice_is_not_deduplicated() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("test_one.tl");
        touch(&file);

        let files = PathWalker::new().walk(&[file.clone(), file.clone()]).unwrap();
        assert_eq!(files, vec![file.clone(), file]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = PathWalker::new().walk(&[missing.clone()]).unwrap_err();
        assert_eq!(err.to_string(), format!("path not found: {}", missing.display()));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path();
        let locked = root.join("locked");
        touch(&locked.join("test_hidden.tl"));
        touch(&root.join("open/test_seen.tl"));
        touch(&root.join("test_top.tl"));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits do not stop a privileged user
        let still_readable = fs::read_dir(&locked).is_ok();
        let result = PathWalker::new().walk(&[root.to_path_buf()]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let files = result.unwrap();
        assert!(files.contains(&root.join("open/test_seen.tl")));
        assert!(files.contains(&root.join("test_top.tl")));
        assert_eq!(
            files.contains(&locked.join("test_hidden.tl")),
            still_readable
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a/test_a.tl"));
        touch(&root.join("b/test_b.tl"));
        std::os::unix::fs::symlink(root.join("gone"), root.join("a/broken")).unwrap();

        let files = PathWalker::new().walk(&[root.to_path_buf()]).unwrap();
        assert_eq!(
            sorted(files),
            vec![root.join("a/test_a.tl"), root.join("b/test_b.tl")]
        );
    }

    #[test]
    fn test_is_ignored() {
        let walker = PathWalker::new();
        assert!(walker.is_ignored(OsStr::new("__pycache__")));
        assert!(walker.is_ignored(OsStr::new("target")));
        assert!(!walker.is_ignored(OsStr::new("tests")));
    }
}
