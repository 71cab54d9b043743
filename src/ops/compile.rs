//! Compilation unit construction.
//!
//! The final step of the pipeline: parse every resolved source, make sure
//! the serialization attributes are declared exactly once, and settle the
//! reference list.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::core::{ResolvedReferenceSet, ResolvedSourceSet};
use crate::resolver::Resolution;
use crate::syntax::annotations::OBJECT_MARKER;
use crate::syntax::{ParseOptions, SyntaxTree, TypeDeclaration};
use crate::util::CancellationToken;

/// Platform libraries every compilation references: the root object type,
/// sequence and collection primitives, tasks, concurrent maps and the
/// member-exclusion marker.
pub const BASELINE_LIBRARIES: &[&str] = &[
    "System.Private.CoreLib.dll",
    "System.Runtime.dll",
    "System.Linq.dll",
    "System.Collections.dll",
    "System.Collections.Concurrent.dll",
    "System.Threading.Tasks.dll",
    "System.Runtime.Serialization.Primitives.dll",
];

/// Path component of runtimes whose libraries must not be referenced.
const EXCLUDED_RUNTIME_DIR: &str = "MonoBleedingEdge";

/// Error while building a compilation unit.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum BuildError {
    #[error("failed to read source file {}", .path.display())]
    #[diagnostic(
        code(wharf::compile::read_source),
        help("source files must exist and be valid UTF-8")
    )]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compilation was cancelled")]
    #[diagnostic(code(wharf::compile::cancelled))]
    Cancelled,
}

impl BuildError {
    /// Whether the build stopped because cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildError::Cancelled)
    }
}

#[derive(Debug)]
struct UnitData {
    name: String,
    trees: Vec<SyntaxTree>,
    references: Vec<PathBuf>,
    options: ParseOptions,
}

/// An immutable set of parsed sources and library references, ready for
/// semantic analysis. Clones share storage.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    data: Arc<UnitData>,
}

impl CompilationUnit {
    /// Name of the compilation.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Parsed sources in source-set order; a synthesised tree comes last.
    pub fn syntax_trees(&self) -> &[SyntaxTree] {
        &self.data.trees
    }

    /// Library references, sorted.
    pub fn references(&self) -> &[PathBuf] {
        &self.data.references
    }

    /// Options every tree was parsed with.
    pub fn options(&self) -> &ParseOptions {
        &self.data.options
    }

    /// Whether the serialization attributes had to be synthesised.
    pub fn has_generated_annotations(&self) -> bool {
        self.data.trees.iter().any(SyntaxTree::is_generated)
    }

    /// Types in user sources marked with the object-marker attribute.
    pub fn serializable_types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.data
            .trees
            .iter()
            .filter(|t| !t.is_generated())
            .flat_map(|t| t.declarations())
            .filter(|d| d.has_attribute(OBJECT_MARKER))
    }

    /// A serializable overview of the unit.
    pub fn summary(&self) -> CompilationSummary {
        CompilationSummary {
            name: self.data.name.clone(),
            options: self.data.options.clone(),
            sources: self
                .data
                .trees
                .iter()
                .filter(|t| !t.is_generated())
                .map(|t| t.path().to_path_buf())
                .collect(),
            generated_annotations: self.has_generated_annotations(),
            references: self.data.references.clone(),
            serializable_types: self.serializable_types().map(|d| d.full_name()).collect(),
        }
    }
}

/// Overview of a [`CompilationUnit`], for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CompilationSummary {
    pub name: String,
    pub options: ParseOptions,
    pub sources: Vec<PathBuf>,
    pub generated_annotations: bool,
    pub references: Vec<PathBuf>,
    pub serializable_types: Vec<String>,
}

/// Builds a [`CompilationUnit`] from resolved sets.
#[derive(Debug, Clone)]
pub struct CompilationBuilder {
    name: String,
    options: ParseOptions,
    framework_dir: Option<PathBuf>,
}

impl CompilationBuilder {
    /// Create a builder parsing with `symbols` defined.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CompilationBuilder {
            name: "WharfCompilation".to_string(),
            options: ParseOptions::with_symbols(symbols),
            framework_dir: None,
        }
    }

    /// Set the compilation name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the platform library directory the baseline references come from.
    pub fn with_framework_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.framework_dir = dir;
        self
    }

    /// Parse options used for every source.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Build from a resolution.
    pub fn build(
        &self,
        resolution: &Resolution,
        token: &CancellationToken,
    ) -> Result<CompilationUnit, BuildError> {
        self.build_from(&resolution.sources, &resolution.references, token)
    }

    /// Build from explicit source and reference sets.
    pub fn build_from(
        &self,
        sources: &ResolvedSourceSet,
        references: &ResolvedReferenceSet,
        token: &CancellationToken,
    ) -> Result<CompilationUnit, BuildError> {
        let paths: Vec<&Path> = sources.iter().collect();
        tracing::info!("Parsing {} source file(s)", paths.len());

        let results: Vec<Result<SyntaxTree, BuildError>> = paths
            .par_iter()
            .map(|path| self.parse_source(path, token))
            .collect();
        let mut trees = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        if token.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        if trees.iter().any(SyntaxTree::declares_object_marker) {
            tracing::debug!("Sources declare {}", OBJECT_MARKER);
        } else {
            tracing::info!("No source declares {}; adding fallback declarations", OBJECT_MARKER);
            trees.push(SyntaxTree::fallback_annotations(&self.options));
        }

        let references = self.final_references(references);

        Ok(CompilationUnit {
            data: Arc::new(UnitData {
                name: self.name.clone(),
                trees,
                references,
                options: self.options.clone(),
            }),
        })
    }

    fn parse_source(
        &self,
        path: &Path,
        token: &CancellationToken,
    ) -> Result<SyntaxTree, BuildError> {
        if token.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        let text = std::fs::read_to_string(path).map_err(|source| BuildError::ReadSource {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(SyntaxTree::parse(path, text, &self.options))
    }

    fn final_references(&self, references: &ResolvedReferenceSet) -> Vec<PathBuf> {
        let mut references = references.clone();
        references.retain(|path| {
            let excluded = path
                .components()
                .any(|c| matches!(c, Component::Normal(s) if s == EXCLUDED_RUNTIME_DIR));
            if excluded {
                tracing::debug!("Dropping reference {}", path.display());
            }
            !excluded
        });

        match &self.framework_dir {
            Some(dir) => {
                for library in BASELINE_LIBRARIES {
                    let path = dir.join(library);
                    if path.is_file() {
                        references.insert(path);
                    } else {
                        tracing::debug!("Baseline library {} not found", path.display());
                    }
                }
            }
            None => tracing::warn!("No platform library directory; baseline references skipped"),
        }

        references.into_vec()
    }
}
