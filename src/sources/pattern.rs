//! Expansion of `<Compile Include>` patterns.
//!
//! Patterns are walked one segment at a time:
//! - a segment containing `**` fans out over every directory below the
//!   current prefix and resolves the rest of the pattern in each of them;
//! - a segment containing `*` or `?` filters the files of the current prefix;
//! - anything else extends the prefix.
//!
//! Whatever prefix remains at the end is either a file (a literal include) or
//! a directory whose sources are listed non-recursively.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::sources::discovery::source_dirs;
use crate::sources::ResolutionError;
use crate::util::fs::{is_source_file, list_files, native_path};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expand one include pattern relative to `root`.
pub fn expand_pattern(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, ResolutionError> {
    let native = native_path(pattern);

    let mut base = if native.is_absolute() {
        PathBuf::new()
    } else {
        root.to_path_buf()
    };
    let mut segments = Vec::new();
    for component in native.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => base.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => segments.push(".."),
            Component::Normal(s) => segments.push(s.to_str().unwrap_or_default()),
        }
    }

    let mut out = Vec::new();
    let mut expansion = Expansion {
        pattern,
        out: &mut out,
    };
    expansion.expand(&base, &segments, true)?;

    tracing::debug!("Pattern `{}` matched {} files", pattern, out.len());
    Ok(out)
}

struct Expansion<'a> {
    pattern: &'a str,
    out: &'a mut Vec<PathBuf>,
}

impl Expansion<'_> {
    /// Resolve `segments` below `dir`. Outside of `strict` mode missing
    /// paths silently match nothing.
    fn expand(&mut self, dir: &Path, segments: &[&str], strict: bool) -> Result<(), ResolutionError> {
        let mut current = dir.to_path_buf();

        for (i, segment) in segments.iter().enumerate() {
            if segment.contains("**") {
                if !current.is_dir() {
                    return self.missing(current, strict);
                }
                let rest = &segments[i + 1..];
                for sub in source_dirs(&current)? {
                    if rest.is_empty() {
                        self.list_sources(&sub)?;
                    } else {
                        self.expand(&sub, rest, false)?;
                    }
                }
                return Ok(());
            }

            if segment.contains(['*', '?']) {
                if !current.is_dir() {
                    return self.missing(current, strict);
                }
                if i + 1 < segments.len() {
                    tracing::debug!(
                        "Pattern `{}`: wildcard directory segments are not expanded",
                        self.pattern
                    );
                }
                return self.filter_sources(&current, segment);
            }

            current.push(segment);
        }

        if current.is_file() {
            self.out.push(current);
        } else if current.is_dir() {
            self.list_sources(&current)?;
        } else if strict && is_source_file(&current) {
            // A literal include of a missing file; reading it fails later.
            self.out.push(current);
        } else {
            return self.missing(current, strict);
        }
        Ok(())
    }

    fn missing(&self, path: PathBuf, strict: bool) -> Result<(), ResolutionError> {
        if strict {
            Err(ResolutionError::MissingDirectory {
                path,
                pattern: Some(self.pattern.to_string()),
            })
        } else {
            Ok(())
        }
    }

    fn list_sources(&mut self, dir: &Path) -> Result<(), ResolutionError> {
        let files = list_files(dir, is_source_file).map_err(|source| ResolutionError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        self.out.extend(files);
        Ok(())
    }

    fn filter_sources(&mut self, dir: &Path, segment: &str) -> Result<(), ResolutionError> {
        let matcher = match Pattern::new(segment) {
            Ok(matcher) => matcher,
            Err(e) => {
                tracing::warn!("Ignoring invalid pattern `{}`: {}", self.pattern, e);
                return Ok(());
            }
        };

        let files = list_files(dir, |path| {
            is_source_file(path)
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| matcher.matches_with(n, MATCH_OPTIONS))
        })
        .map_err(|source| ResolutionError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        self.out.extend(files);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestTree;

    fn sample_tree() -> TestTree {
        let tree = TestTree::new();
        tree.file("proj/Root.cs", "");
        tree.file("proj/Models/User.cs", "");
        tree.file("proj/Models/Item.cs", "");
        tree.file("proj/Models/readme.md", "");
        tree.file("proj/Models/Deep/Order.cs", "");
        tree.file("proj/Models/Deep/Er/Line.cs", "");
        tree.file("proj/Models/bin/Gen.cs", "");
        tree.file("proj/Models/Deep/obj/Tmp.cs", "");
        tree
    }

    #[test]
    fn test_recursive_wildcard_unions_all_depths() {
        let tree = sample_tree();
        let files = expand_pattern(&tree.path("proj"), r"Models\**\*.cs").unwrap();
        let mut rel = tree.relative(&files);
        rel.sort();
        assert_eq!(
            rel,
            [
                "proj/Models/Deep/Er/Line.cs",
                "proj/Models/Deep/Order.cs",
                "proj/Models/Item.cs",
                "proj/Models/User.cs",
            ]
        );
    }

    #[test]
    fn test_recursive_wildcard_without_suffix() {
        let tree = sample_tree();
        let files = expand_pattern(&tree.path("proj"), "Models/**").unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_recursive_wildcard_with_literal_suffix() {
        let tree = sample_tree();
        let files = expand_pattern(&tree.path("proj"), "**/Order.cs").unwrap();
        assert_eq!(tree.relative(&files), ["proj/Models/Deep/Order.cs"]);
    }

    #[test]
    fn test_filename_glob() {
        let tree = sample_tree();
        let files = expand_pattern(&tree.path("proj"), "Models/U*.cs").unwrap();
        assert_eq!(tree.relative(&files), ["proj/Models/User.cs"]);

        let files = expand_pattern(&tree.path("proj"), "Models/*").unwrap();
        assert_eq!(tree.relative(&files), ["proj/Models/Item.cs", "proj/Models/User.cs"]);
    }

    #[test]
    fn test_literal_file_and_directory() {
        let tree = sample_tree();
        let files = expand_pattern(&tree.path("proj"), "Root.cs").unwrap();
        assert_eq!(tree.relative(&files), ["proj/Root.cs"]);

        let files = expand_pattern(&tree.path("proj"), "Models").unwrap();
        assert_eq!(tree.relative(&files), ["proj/Models/Item.cs", "proj/Models/User.cs"]);

        let files = expand_pattern(&tree.path("proj/Models"), "../Root.cs").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("Root.cs"));
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        let tree = sample_tree();
        let files = expand_pattern(&tree.path("proj"), "Models/*.vb").unwrap();
        assert!(files.is_empty());

        let files = expand_pattern(&tree.path("proj"), "**/Missing.cs").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_literal_source_is_kept() {
        let tree = sample_tree();
        let files = expand_pattern(&tree.path("proj"), "Gone.cs").unwrap();
        assert_eq!(files, [tree.path("proj/Gone.cs")]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let tree = sample_tree();
        let err = expand_pattern(&tree.path("proj"), "Nowhere/**/*.cs").unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::MissingDirectory { pattern: Some(p), .. } if p == "Nowhere/**/*.cs"
        ));

        assert!(expand_pattern(&tree.path("proj"), "Nowhere").is_err());
    }

    #[test]
    fn test_absolute_pattern() {
        let tree = sample_tree();
        let pattern = format!("{}/*.cs", tree.path("proj/Models").display());
        let files = expand_pattern(Path::new("/unrelated"), &pattern).unwrap();
        assert_eq!(files.len(), 2);
    }
}
