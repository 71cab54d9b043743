//! High-level operations.
//!
//! The pipeline is assemble, then compile. [`compile_projects`] and
//! [`compile_directory`] run both steps with settings from a
//! [`GlobalContext`].

pub mod assemble;
pub mod compile;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::resolver::ResolveError;
use crate::util::{CancellationToken, GlobalContext};

pub use assemble::ProjectGraphAssembler;
pub use compile::{BuildError, CompilationBuilder, CompilationSummary, CompilationUnit};

/// Any failure of the pipeline.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum WharfError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),
}

impl WharfError {
    /// Whether the pipeline stopped because cancellation was requested,
    /// rather than because of a problem with the projects.
    pub fn is_cancelled(&self) -> bool {
        match self {
            WharfError::Resolve(e) => e.is_cancelled(),
            WharfError::Build(e) => e.is_cancelled(),
        }
    }
}

/// Options for one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Preprocessor symbols, in addition to the configured defaults
    pub defines: Vec<String>,
    /// Compilation name; derived from the first root when unset
    pub name: Option<String>,
}

/// Resolve `roots` and build one compilation unit from them.
pub fn compile_projects(
    gctx: &GlobalContext,
    roots: &[PathBuf],
    opts: &CompileOptions,
    token: &CancellationToken,
) -> Result<CompilationUnit, WharfError> {
    let resolution = ProjectGraphAssembler::from_context(gctx).assemble_projects(roots, token)?;
    let name = opts
        .name
        .clone()
        .or_else(|| roots.first().and_then(|r| file_stem(r)));
    let unit = builder(gctx, opts, name).build(&resolution, token)?;
    Ok(unit)
}

/// Collect the sources below `dir` and build one compilation unit from them.
pub fn compile_directory(
    gctx: &GlobalContext,
    dir: &Path,
    opts: &CompileOptions,
    token: &CancellationToken,
) -> Result<CompilationUnit, WharfError> {
    let resolution = ProjectGraphAssembler::from_context(gctx).assemble_directory(dir, token)?;
    let name = opts.name.clone().or_else(|| file_stem(dir));
    let unit = builder(gctx, opts, name).build(&resolution, token)?;
    Ok(unit)
}

fn builder(
    gctx: &GlobalContext,
    opts: &CompileOptions,
    name: Option<String>,
) -> CompilationBuilder {
    let symbols: BTreeSet<&String> = gctx
        .default_symbols()
        .iter()
        .chain(opts.defines.iter())
        .collect();

    let builder = CompilationBuilder::new(symbols.into_iter().cloned())
        .with_framework_dir(gctx.framework_dir().map(Path::to_path_buf));
    match name {
        Some(name) => builder.with_name(name),
        None => builder,
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}
