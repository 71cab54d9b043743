//! `wharf tree` command

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use crate::cli::{GlobalArgs, TreeArgs};
use crate::commands::{absolute, context};
use wharf::core::ProjectGraph;
use wharf::ops::ProjectGraphAssembler;
use wharf::util::fs::relative_path;
use wharf::util::{CancellationToken, GlobalContext};
use wharf::WharfError;

pub fn execute(args: TreeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = context(global)?;

    let roots: Vec<_> = args.projects.iter().map(|p| absolute(ctx.cwd(), p)).collect();
    let resolution = ProjectGraphAssembler::from_context(&ctx)
        .assemble_projects(&roots, &CancellationToken::new())
        .map_err(WharfError::from)?;

    let graph = &resolution.graph;
    let max_depth = args.depth.unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    for root in graph.roots() {
        print_tree(&ctx, graph, root, 0, max_depth, &mut seen, args.duplicates);
    }

    Ok(())
}

fn print_tree<'g>(
    ctx: &GlobalContext,
    graph: &'g ProjectGraph,
    project: &'g Path,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<&'g Path>,
    show_duplicates: bool,
) {
    if depth > max_depth {
        return;
    }

    let is_duplicate = !seen.insert(project);

    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    };

    let dup_marker = if is_duplicate && !show_duplicates {
        " (*)"
    } else {
        ""
    };

    let name = project
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let location = relative_path(ctx.cwd(), project);
    println!("{}{} ({}){}", prefix, name, location.display(), dup_marker);

    if is_duplicate && !show_duplicates {
        return;
    }

    for reference in graph.references(project) {
        print_tree(ctx, graph, reference, depth + 1, max_depth, seen, show_duplicates);
    }
}
