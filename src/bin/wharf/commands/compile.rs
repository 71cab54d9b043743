//! `wharf compile` command

use anyhow::Result;

use crate::cli::{CompileArgs, GlobalArgs};
use crate::commands::{absolute, context, projects_in};
use wharf::ops::{compile_directory, compile_projects, CompilationUnit, CompileOptions};
use wharf::util::fs::relative_path;
use wharf::util::{CancellationToken, GlobalContext};

pub fn execute(args: CompileArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = context(global)?;

    let opts = CompileOptions {
        defines: args.defines,
        name: args.name,
    };
    let token = CancellationToken::new();

    let unit = if let Some(dir) = &args.dir {
        compile_directory(&ctx, &absolute(ctx.cwd(), dir), &opts, &token)?
    } else {
        let roots = if args.projects.is_empty() {
            projects_in(ctx.cwd())?
        } else {
            args.projects
                .iter()
                .map(|p| absolute(ctx.cwd(), p))
                .collect()
        };

        if roots.is_empty() {
            tracing::info!("No project files found; compiling the current directory");
            compile_directory(&ctx, ctx.cwd(), &opts, &token)?
        } else {
            compile_projects(&ctx, &roots, &opts, &token)?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&unit.summary())?);
    } else {
        print_summary(&ctx, &unit);
    }

    Ok(())
}

fn print_summary(ctx: &GlobalContext, unit: &CompilationUnit) {
    let summary = unit.summary();

    println!("Compilation {}", summary.name);
    println!("  {} source file(s)", summary.sources.len());
    if ctx.is_verbose() {
        for source in &summary.sources {
            println!("    {}", relative_path(ctx.cwd(), source).display());
        }
    }
    if summary.generated_annotations {
        println!("  + generated serialization attributes");
    }

    println!("  {} reference(s)", summary.references.len());
    if ctx.is_verbose() {
        for reference in &summary.references {
            println!("    {}", reference.display());
        }
    }

    println!("  {} serializable type(s)", summary.serializable_types.len());
    for name in &summary.serializable_types {
        println!("    {}", name);
    }
}
