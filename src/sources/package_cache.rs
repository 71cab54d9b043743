//! Package cache lookup.
//!
//! Restored packages live at
//! `<root>/<id-lowercase>/<version>/lib/<framework>/*.dll`. Caches written by
//! different tools disagree on casing, so lookup falls back from the exact
//! path to a fully lowercased one and finally to a case-insensitive walk.

use std::path::{Path, PathBuf};

use crate::util::fs::{has_extension, list_files, LIBRARY_EXTENSION};

/// Locates package libraries inside an extracted package cache.
#[derive(Debug, Clone)]
pub struct PackageCacheLocator {
    root: PathBuf,
}

impl PackageCacheLocator {
    /// Create a locator for the cache at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PackageCacheLocator { root: root.into() }
    }

    /// Find the library directory of a package for one target framework.
    pub fn package_dir(&self, id: &str, version: &str, framework: &str) -> Option<PathBuf> {
        let segments = [
            id.trim().to_lowercase(),
            version.trim().to_string(),
            "lib".to_string(),
            framework.trim().to_string(),
        ];

        let exact: PathBuf = segments.iter().fold(self.root.clone(), |p, s| p.join(s));
        if exact.is_dir() {
            return Some(exact);
        }

        let lowered = PathBuf::from(exact.to_string_lossy().to_lowercase());
        if lowered.is_dir() {
            return Some(lowered);
        }

        find_dir_ignoring_case(&self.root, &segments)
    }

    /// All libraries of a package for one target framework.
    ///
    /// A package that is not in the cache yields no libraries.
    pub fn locate(&self, id: &str, version: &str, framework: &str) -> Vec<PathBuf> {
        let Some(dir) = self.package_dir(id, version, framework) else {
            tracing::debug!(
                "Package {} {} ({}) not found in {}",
                id,
                version,
                framework,
                self.root.display()
            );
            return Vec::new();
        };

        match list_files(&dir, |p| has_extension(p, LIBRARY_EXTENSION)) {
            Ok(libraries) => {
                tracing::debug!("Package {} {}: {} libraries", id, version, libraries.len());
                libraries
            }
            Err(e) => {
                tracing::warn!("Failed to list {}: {}", dir.display(), e);
                Vec::new()
            }
        }
    }
}

/// Follow `segments` below `base`, matching each one against the directory
/// entries without regard to ASCII case.
fn find_dir_ignoring_case(base: &Path, segments: &[String]) -> Option<PathBuf> {
    let mut current = base.to_path_buf();
    for segment in segments {
        let exact = current.join(segment);
        if exact.is_dir() {
            current = exact;
            continue;
        }

        current = std::fs::read_dir(&current)
            .ok()?
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.eq_ignore_ascii_case(segment))
                    && entry.path().is_dir()
            })?
            .path();
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestTree;

    #[test]
    fn test_exact_layout() {
        let tree = TestTree::new();
        tree.file("cache/mypkg/1.0.0/lib/net6.0/MyPkg.dll", "");
        tree.file("cache/mypkg/1.0.0/lib/net6.0/MyPkg.xml", "");

        let locator = PackageCacheLocator::new(tree.path("cache"));
        let libs = locator.locate("MyPkg", "1.0.0", "net6.0");
        assert_eq!(tree.relative(&libs), ["cache/mypkg/1.0.0/lib/net6.0/MyPkg.dll"]);
    }

    #[test]
    fn test_mixed_case_package_directory() {
        let tree = TestTree::new();
        tree.file("cache/MyPkg/1.0.0/lib/net6.0/MyPkg.dll", "");

        let locator = PackageCacheLocator::new(tree.path("cache"));
        let libs = locator.locate("mypkg", "1.0.0", "net6.0");
        assert_eq!(libs.len(), 1);
        assert!(libs[0].ends_with("MyPkg/1.0.0/lib/net6.0/MyPkg.dll"));
    }

    #[test]
    fn test_only_lowercase_variant_exists() {
        let tree = TestTree::new();
        tree.file("cache/mypkg/1.0.0-beta/lib/net6.0/MyPkg.dll", "");

        let locator = PackageCacheLocator::new(tree.path("cache"));
        let libs = locator.locate("MyPkg", "1.0.0-Beta", "NET6.0");
        assert_eq!(libs.len(), 1);
    }

    #[test]
    fn test_missing_package_is_empty() {
        let tree = TestTree::new();
        tree.file("cache/other/2.0.0/lib/net6.0/Other.dll", "");

        let locator = PackageCacheLocator::new(tree.path("cache"));
        assert!(locator.locate("mypkg", "1.0.0", "net6.0").is_empty());
        assert!(locator.locate("other", "2.0.0", "net8.0").is_empty());

        let nowhere = PackageCacheLocator::new(tree.path("no-cache"));
        assert!(nowhere.locate("other", "2.0.0", "net6.0").is_empty());
    }
}
