//! Convention-based source discovery.
//!
//! SDK-style projects compile every `.cs` file under their directory except
//! build output. The same walk is used for shared-project folders and for
//! descriptor-less directories.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::sources::ResolutionError;
use crate::util::fs::{is_build_output_dir, is_source_file};

/// Collect every source file under `root`, skipping `bin` and `obj`
/// directories at any depth.
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>, ResolutionError> {
    if !root.is_dir() {
        return Err(ResolutionError::MissingDirectory {
            path: root.to_path_buf(),
            pattern: None,
        });
    }

    let mut files = Vec::new();
    for entry in source_walker(root) {
        let entry = entry.map_err(|source| ResolutionError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!("Discovered {} sources under {}", files.len(), root.display());
    Ok(files)
}

/// Every directory under `root`, `root` included, with build output pruned.
pub(crate) fn source_dirs(root: &Path) -> Result<Vec<PathBuf>, ResolutionError> {
    let mut dirs = Vec::new();
    for entry in source_walker(root) {
        let entry = entry.map_err(|source| ResolutionError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn source_walker(root: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_pruned(entry))
}

fn is_pruned(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(is_build_output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestTree;

    #[test]
    fn test_prunes_bin_and_obj_at_every_level() {
        let tree = TestTree::new();
        tree.file("P/A.cs", "");
        tree.file("P/sub/B.cs", "");
        tree.file("P/bin/C.cs", "");
        tree.file("P/obj/nested/D.cs", "");
        tree.file("P/sub/obj/E.cs", "");
        tree.file("P/sub/notes.txt", "");

        let files = discover_sources(&tree.path("P")).unwrap();
        assert_eq!(tree.relative(&files), ["P/A.cs", "P/sub/B.cs"]);
    }

    #[test]
    fn test_root_named_bin_is_still_scanned() {
        let tree = TestTree::new();
        tree.file("bin/A.cs", "");

        let files = discover_sources(&tree.path("bin")).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_root() {
        let tree = TestTree::new();
        let err = discover_sources(&tree.path("nope")).unwrap_err();
        assert!(matches!(err, ResolutionError::MissingDirectory { .. }));
    }

    #[test]
    fn test_source_dirs_includes_root() {
        let tree = TestTree::new();
        tree.file("src/a/x.cs", "");
        tree.file("src/obj/y.cs", "");

        let dirs = source_dirs(&tree.path("src")).unwrap();
        assert_eq!(tree.relative(&dirs), ["src", "src/a"]);
    }
}
