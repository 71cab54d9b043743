//! Resolution error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::DescriptorError;
use crate::sources::ResolutionError;

/// Error while resolving a project graph.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ResolveError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Sources(#[from] ResolutionError),

    #[error("project reference cycle: {}", format_cycle(.cycle))]
    #[diagnostic(
        code(wharf::resolve::cycle),
        help("Break the cycle by removing one of the project references")
    )]
    CycleDetected { cycle: Vec<PathBuf> },

    #[error("resolution was cancelled")]
    #[diagnostic(code(wharf::resolve::cancelled))]
    Cancelled,
}

impl ResolveError {
    /// Whether this error only reports a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResolveError::Cancelled)
    }
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = ResolveError::CycleDetected {
            cycle: vec![
                PathBuf::from("/src/A/A.csproj"),
                PathBuf::from("/src/B/B.csproj"),
                PathBuf::from("/src/A/A.csproj"),
            ],
        };

        assert_eq!(
            err.to_string(),
            "project reference cycle: A.csproj -> B.csproj -> A.csproj"
        );
        assert!(!err.is_cancelled());
        assert!(ResolveError::Cancelled.is_cancelled());
    }
}
