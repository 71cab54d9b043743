//! Deduplicated, ordered sets of resolved files.
//!
//! Every inserted path is normalized to an absolute path first, so the same
//! file reached through different relative spellings is stored once. Iteration
//! is lexicographic and therefore stable across runs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::util::fs::normalize_path;

/// Absolute source file paths contributing to a compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSourceSet {
    paths: BTreeSet<PathBuf>,
}

/// Absolute library paths referenced by a compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedReferenceSet {
    paths: BTreeSet<PathBuf>,
}

impl ResolvedSourceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: impl AsRef<Path>) -> bool {
        self.paths.insert(normalize_path(path.as_ref()))
    }

    /// Check whether a path is present.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.paths.contains(&normalize_path(path.as_ref()))
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Consume the set into an ordered vector.
    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths.into_iter().collect()
    }
}

impl<P: AsRef<Path>> Extend<P> for ResolvedSourceSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for path in iter {
            self.insert(path);
        }
    }
}

impl ResolvedReferenceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: impl AsRef<Path>) -> bool {
        self.paths.insert(normalize_path(path.as_ref()))
    }

    /// Check whether a path is present.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.paths.contains(&normalize_path(path.as_ref()))
    }

    /// Number of libraries.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Keep only the paths matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.paths.retain(|p| keep(p));
    }

    /// Consume the set into an ordered vector.
    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths.into_iter().collect()
    }
}

impl<P: AsRef<Path>> Extend<P> for ResolvedReferenceSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for path in iter {
            self.insert(path);
        }
    }
}
