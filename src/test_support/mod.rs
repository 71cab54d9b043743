//! Test utilities for Wharf unit tests.
//!
//! Tests build small project trees on disk inside a temporary directory and
//! compare results as `/`-separated paths relative to its root.
//!
//! # Example
//!
//! ```rust,ignore
//! use wharf::test_support::TestTree;
//!
//! #[test]
//! fn test_example() {
//!     let tree = TestTree::new();
//!     tree.file("App/Program.cs", "class Program {}");
//!     let project = tree.sdk_project("App/App.csproj", "");
//!     // Resolve `project`...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::util::fs::normalize_path;

pub use fixtures::*;

/// A scratch directory tree that is removed on drop.
#[derive(Debug)]
pub struct TestTree {
    // Held for its Drop.
    _tmp: TempDir,
    root: PathBuf,
}

impl TestTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        // Canonical so results of canonicalize() strip cleanly (macOS /var).
        let root = tmp.path().canonicalize().expect("canonicalize temp dir");
        TestTree { _tmp: tmp, root }
    }

    /// Root of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `rel` inside the tree. Nothing is created.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, contents).expect("write test file");
        path
    }

    /// Write an SDK-style project whose `<Project>` element wraps `body`.
    pub fn sdk_project(&self, rel: &str, body: &str) -> PathBuf {
        self.file(rel, &sdk_project_xml(body))
    }

    /// Paths relative to the root, `/`-separated, in the given order.
    pub fn relative(&self, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| {
                let p = normalize_path(p);
                let rel = p.strip_prefix(&self.root).unwrap_or(&p);
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect()
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}
