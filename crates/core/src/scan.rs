//! Directory scanning for pushable files
//!
//! Produces the local file set handed to the reconciler: a map from
//! forward-slash relative path to raw file content.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use color_eyre::Result;
use ignore::WalkBuilder;

/// The local file set: relative path (forward-slash separated) -> content.
///
/// Keyed rather than sequenced, so reconciliation is insensitive to
/// filesystem iteration order.
pub type LocalFiles = BTreeMap<String, Vec<u8>>;

/// Scanner for directory trees of pushable files.
///
/// Carries the original glob semantics of `**/*.*`: only files whose name
/// has an extension are picked up, and dotfiles (which have no extension,
/// e.g. `.env`) are skipped. Extension-less files can be opted in via
/// [`Scanner::include_extensionless`].
pub struct Scanner {
    root: PathBuf,
    include_extensionless: bool,
}

impl Scanner {
    /// Create a new scanner for the given root directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_extensionless: false,
        }
    }

    /// Also pick up files without an extension
    #[must_use]
    pub fn include_extensionless(mut self, include: bool) -> Self {
        self.include_extensionless = include;
        self
    }

    /// Scan the directory and return all pushable files.
    ///
    /// A missing root directory yields an empty map (nothing to push), not
    /// an error. Unreadable directories or files abort the scan.
    ///
    /// # Errors
    /// Returns an error if directory traversal or file reading fails.
    pub fn scan(&self) -> Result<LocalFiles> {
        let mut files = LocalFiles::new();

        if !self.root.exists() {
            return Ok(files);
        }

        for result in self.walk_builder().build() {
            let entry = result?;
            let path = entry.path();

            // Skip directories, only process files
            if !path.is_file() {
                continue;
            }

            if !self.include_extensionless && path.extension().is_none() {
                continue;
            }

            let relative = path.strip_prefix(&self.root)?;
            let content = std::fs::read(path)?;
            files.insert(portable_path(relative), content);
        }

        Ok(files)
    }

    fn walk_builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true) // Dotfiles never matched the original glob
            .ignore(false) // Push everything, ignore files have no say here
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .require_git(false);
        builder
    }
}

/// Render a relative path with forward-slash separators on every platform,
/// so signature keys are portable across hosts.
#[must_use]
pub fn portable_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_simple_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file1.txt"), "hello").unwrap();
        fs::write(dir.path().join("file2.txt"), "world").unwrap();

        let files = Scanner::new(dir.path()).scan().unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files["file1.txt"], b"hello");
        assert_eq!(files["file2.txt"], b"world");
    }

    #[test]
    fn test_scan_nested_directories_uses_forward_slashes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/dir")).unwrap();
        fs::write(dir.path().join("root.txt"), "root").unwrap();
        fs::write(dir.path().join("sub/nested.css"), "nested").unwrap();
        fs::write(dir.path().join("sub/dir/deep.js"), "deep").unwrap();

        let files = Scanner::new(dir.path()).scan().unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.contains_key("sub/nested.css"));
        assert!(files.contains_key("sub/dir/deep.js"));
    }

    #[test]
    fn test_scan_skips_extensionless_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README"), "no extension").unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();

        let files = Scanner::new(dir.path()).scan().unwrap();

        assert_eq!(files.len(), 1);
        assert!(files.contains_key("index.html"));
    }

    #[test]
    fn test_scan_include_extensionless_opt_in() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README"), "no extension").unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();

        let files = Scanner::new(dir.path())
            .include_extensionless(true)
            .scan()
            .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.contains_key("README"));
    }

    #[test]
    fn test_scan_skips_dotfiles() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        fs::write(dir.path().join("keep.txt"), "keep").unwrap();

        let files = Scanner::new(dir.path()).scan().unwrap();

        assert_eq!(files.len(), 1);
        assert!(files.contains_key("keep.txt"));
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = Scanner::new(dir.path().join("does-not-exist"))
            .scan()
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_empty_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = Scanner::new(dir.path()).scan().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_portable_path() {
        let p = Path::new("a").join("b").join("c.txt");
        assert_eq!(portable_path(&p), "a/b/c.txt");
    }
}
