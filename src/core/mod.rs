//! Core data structures for Wharf.
//!
//! This module contains the types the rest of the crate passes around:
//! - Project descriptors parsed from `.csproj` files
//! - Deduplicated source and reference sets
//! - The project reference graph

pub mod descriptor;
pub mod graph;
pub mod path_set;

pub use descriptor::{
    AssemblyReference, DescriptorError, DescriptorFormat, PackageReference, ProjectDescriptor,
};
pub use graph::ProjectGraph;
pub use path_set::{ResolvedReferenceSet, ResolvedSourceSet};
