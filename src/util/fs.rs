//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Extension of C# source files.
pub const SOURCE_EXTENSION: &str = "cs";

/// Extension of managed libraries.
pub const LIBRARY_EXTENSION: &str = "dll";

/// Directory names that hold build output and are never scanned for sources.
pub const BUILD_OUTPUT_DIRS: [&str; 2] = ["bin", "obj"];

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Check whether a path carries the given extension, ignoring ASCII case.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Check whether a path is a C# source file by name.
pub fn is_source_file(path: &Path) -> bool {
    has_extension(path, SOURCE_EXTENSION)
}

/// Check whether a directory name denotes build output (`bin` or `obj`).
pub fn is_build_output_dir(name: &str) -> bool {
    BUILD_OUTPUT_DIRS.contains(&name)
}

/// Convert a path written in a descriptor to a host path.
///
/// Descriptors are usually authored on Windows, so `\` is treated as a
/// separator on every platform.
pub fn native_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if std::path::MAIN_SEPARATOR == '\\' {
        PathBuf::from(raw.replace('/', "\\"))
    } else {
        PathBuf::from(raw.replace('\\', "/"))
    }
}

/// Canonicalize a path, falling back to a lexical normalization when the
/// path does not exist. The result is always absolute.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .unwrap_or_else(|_| lexical_normalize(path))
}

/// Make a path absolute and resolve `.` and `..` without touching the disk.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// List the files directly inside `dir` that satisfy `keep`, sorted.
pub fn list_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && keep(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_native_path_converts_backslashes() {
        let path = native_path(r"..\Shared\Shared.projitems");
        let parts: Vec<_> = path.components().collect();
        assert_eq!(parts.len(), 3);
        assert!(path.ends_with("Shared.projitems"));
    }

    #[test]
    fn test_lexical_normalize() {
        let path = lexical_normalize(Path::new("/a/b/../c/./d.cs"));
        assert_eq!(path, PathBuf::from("/a/c/d.cs"));
    }

    #[test]
    fn test_has_extension_ignores_case() {
        assert!(is_source_file(Path::new("Foo.CS")));
        assert!(has_extension(Path::new("Lib.DLL"), LIBRARY_EXTENSION));
        assert!(!is_source_file(Path::new("Foo.csproj")));
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.cs"), "").unwrap();
        fs::write(tmp.path().join("a.cs"), "").unwrap();
        fs::write(tmp.path().join("readme.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("nested.cs")).unwrap();

        let files = list_files(tmp.path(), is_source_file).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.cs", "b.cs"]);
    }
}
