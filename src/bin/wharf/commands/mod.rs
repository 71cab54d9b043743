//! Command implementations

pub mod compile;
pub mod tree;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use wharf::util::fs::{has_extension, list_files};
use wharf::util::GlobalContext;

use crate::cli::GlobalArgs;

/// Build the context for a command, applying command-line overrides.
pub fn context(args: &GlobalArgs) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(args.verbose);

    if let Some(packages) = &args.packages {
        let root = absolute(ctx.cwd(), packages);
        ctx = ctx.with_package_root(root);
    }
    if let Some(dir) = &args.framework_dir {
        let dir = absolute(ctx.cwd(), dir);
        ctx = ctx.with_framework_dir(Some(dir));
    }

    Ok(ctx)
}

/// Project files in `dir`, sorted.
pub fn projects_in(dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(dir, |p| has_extension(p, "csproj"))
        .with_context(|| format!("failed to list {}", dir.display()))
}

/// Resolve a user-supplied path against the working directory.
pub fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
