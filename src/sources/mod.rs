//! Source and library discovery.
//!
//! Sources come from two places: the project directory itself (SDK-style
//! projects and shared folders) and explicit `<Compile>` patterns. Libraries
//! of package references come from the local package cache.

pub mod discovery;
pub mod package_cache;
pub mod pattern;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::ProjectDescriptor;

pub use discovery::discover_sources;
pub use package_cache::PackageCacheLocator;
pub use pattern::expand_pattern;

/// Error while turning a descriptor into concrete source files.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ResolutionError {
    #[error("source directory does not exist: {}", .path.display())]
    #[diagnostic(
        code(wharf::sources::missing_directory),
        help("check the <Compile> and <Import> paths in the project file")
    )]
    MissingDirectory {
        path: PathBuf,
        /// The include pattern being expanded, if any
        pattern: Option<String>,
    },

    #[error("failed to scan {}", .path.display())]
    #[diagnostic(code(wharf::sources::walk))]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to list {}", .path.display())]
    #[diagnostic(code(wharf::sources::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Computes the source files a single descriptor contributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceSetResolver;

impl SourceSetResolver {
    /// Union of convention discovery (SDK-style only), explicit compile
    /// patterns and shared-project folders, in that order. Duplicates are
    /// left for the caller's set to collapse.
    pub fn resolve(&self, descriptor: &ProjectDescriptor) -> Result<Vec<PathBuf>, ResolutionError> {
        let mut sources = Vec::new();

        if descriptor.is_modern() {
            sources.extend(discover_sources(descriptor.dir())?);
        }

        for pattern in descriptor.compile_items() {
            sources.extend(expand_pattern(descriptor.dir(), pattern)?);
        }

        for folder in descriptor.shared_imports() {
            sources.extend(discover_sources(folder)?);
        }

        tracing::debug!(
            "{}: {} source entries",
            descriptor.path().display(),
            sources.len()
        );
        Ok(sources)
    }
}
