//! Project and reference resolution.
//!
//! The resolver walks the project reference graph depth-first. All state of
//! one walk lives in a [`ResolutionContext`] owned by the caller: the merged
//! source and reference sets, the visited projects, and the stack of projects
//! currently being resolved (used to tell cycles from diamonds).

pub mod errors;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::{
    AssemblyReference, DescriptorError, ProjectDescriptor, ProjectGraph, ResolvedReferenceSet,
    ResolvedSourceSet,
};
use crate::sources::{PackageCacheLocator, SourceSetResolver};
use crate::util::fs::LIBRARY_EXTENSION;
use crate::util::CancellationToken;

pub use errors::ResolveError;

/// The merged output of a resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Every source file contributed by every visited project
    pub sources: ResolvedSourceSet,
    /// Every library referenced by every visited project
    pub references: ResolvedReferenceSet,
    /// The projects visited and their references
    pub graph: ProjectGraph,
}

/// Accumulators for one resolution, threaded through the recursion.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    resolution: Resolution,
    visited: HashSet<PathBuf>,
    stack: Vec<PathBuf>,
}

impl ResolutionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources merged so far.
    pub fn sources_mut(&mut self) -> &mut ResolvedSourceSet {
        &mut self.resolution.sources
    }

    /// Graph built so far.
    pub fn graph_mut(&mut self) -> &mut ProjectGraph {
        &mut self.resolution.graph
    }

    /// Check whether a canonical descriptor path was already resolved.
    pub fn is_visited(&self, path: &Path) -> bool {
        self.visited.contains(path)
    }

    /// Hand off the merged result.
    pub fn finish(self) -> Resolution {
        self.resolution
    }
}

/// Resolves what a descriptor contributes, recursing into project references.
#[derive(Debug)]
pub struct ReferenceResolver<'a> {
    packages: &'a PackageCacheLocator,
    framework_dir: Option<&'a Path>,
    sources: SourceSetResolver,
    token: &'a CancellationToken,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver.
    ///
    /// `framework_dir` is the platform's base library directory; references
    /// without a hint path resolve against it.
    pub fn new(
        packages: &'a PackageCacheLocator,
        framework_dir: Option<&'a Path>,
        token: &'a CancellationToken,
    ) -> Self {
        ReferenceResolver {
            packages,
            framework_dir,
            sources: SourceSetResolver,
            token,
        }
    }

    /// Resolve the descriptor at `path` and everything it references into
    /// `cx`. Returns the canonical descriptor path.
    ///
    /// A project that was already resolved contributes nothing the second
    /// time. Reaching a project that is still being resolved is a cycle.
    pub fn resolve_project(
        &self,
        path: &Path,
        cx: &mut ResolutionContext,
    ) -> Result<PathBuf, ResolveError> {
        if self.token.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let canonical = path.canonicalize().map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(pos) = cx.stack.iter().position(|p| *p == canonical) {
            let mut cycle = cx.stack[pos..].to_vec();
            cycle.push(canonical);
            return Err(ResolveError::CycleDetected { cycle });
        }

        if !cx.visited.insert(canonical.clone()) {
            tracing::debug!("{} already resolved", canonical.display());
            return Ok(canonical);
        }

        tracing::debug!("Resolving {}", canonical.display());
        let descriptor = ProjectDescriptor::load(&canonical)?;
        cx.resolution.graph.add_project(&canonical);

        cx.stack.push(canonical.clone());
        let result = self.resolve_descriptor(&descriptor, cx);
        cx.stack.pop();
        result?;

        Ok(canonical)
    }

    fn resolve_descriptor(
        &self,
        descriptor: &ProjectDescriptor,
        cx: &mut ResolutionContext,
    ) -> Result<(), ResolveError> {
        let sources = self.sources.resolve(descriptor)?;
        cx.resolution.sources.extend(sources);

        for reference in descriptor.assembly_references() {
            if let Some(path) = self.assembly_path(descriptor, reference) {
                cx.resolution.references.insert(path);
            }
        }

        if !descriptor.package_references().is_empty() {
            match descriptor.primary_target_framework() {
                Some(framework) => {
                    for package in descriptor.package_references() {
                        let libraries =
                            self.packages.locate(&package.id, &package.version, framework);
                        cx.resolution.references.extend(libraries);
                    }
                }
                None => tracing::warn!(
                    "{} declares packages but no target framework; skipping package references",
                    descriptor.path().display()
                ),
            }
        }

        for reference in descriptor.project_references() {
            let child = self.resolve_project(reference, cx)?;
            cx.resolution.graph.add_reference(descriptor.path(), &child);
        }

        Ok(())
    }

    /// Resolve one `<Reference>` to an existing library file.
    pub fn assembly_path(
        &self,
        descriptor: &ProjectDescriptor,
        reference: &AssemblyReference,
    ) -> Option<PathBuf> {
        let path = match &reference.hint_path {
            Some(hint) => descriptor.dir().join(hint),
            None => {
                let Some(framework_dir) = self.framework_dir else {
                    tracing::debug!(
                        "No platform library directory; skipping reference `{}`",
                        reference.name
                    );
                    return None;
                };
                framework_dir.join(format!("{}.{}", reference.name, LIBRARY_EXTENSION))
            }
        };

        if path.is_file() {
            Some(path)
        } else {
            tracing::debug!(
                "Reference `{}` not found at {}",
                reference.name,
                path.display()
            );
            None
        }
    }
}
