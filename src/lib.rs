//! Wharf - project graph resolver and compilation assembler for C# projects
//!
//! This crate turns one or more `.csproj` descriptors, or a bare source
//! directory, into a single immutable compilation unit: every source file
//! and every library the projects imply, parsed and deduplicated, ready for
//! a code generator to analyse.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod syntax;
pub mod util;

/// Test utilities for Wharf unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It builds throwaway project trees on disk.
#[cfg(test)]
pub mod test_support;

pub use core::{ProjectDescriptor, ProjectGraph, ResolvedReferenceSet, ResolvedSourceSet};
pub use ops::{compile_directory, compile_projects, CompilationUnit, CompileOptions, WharfError};
pub use resolver::{Resolution, ResolveError};
pub use syntax::{ParseOptions, SyntaxTree};
pub use util::{CancellationToken, GlobalContext};
