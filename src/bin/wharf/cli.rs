//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Wharf - project graph resolver and compilation assembler for C#
#[derive(Parser)]
#[command(name = "wharf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Package cache root (overrides NUGET_PACKAGES and config)
    #[arg(long, global = true, value_name = "DIR")]
    pub packages: Option<PathBuf>,

    /// Platform library directory (overrides WHARF_FRAMEWORK_DIR and config)
    #[arg(long, global = true, value_name = "DIR")]
    pub framework_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve projects and assemble one compilation unit
    Compile(CompileArgs),

    /// Display the project reference tree
    Tree(TreeArgs),
}

#[derive(Args)]
pub struct CompileArgs {
    /// Project files to compile (defaults to the .csproj files in the
    /// current directory)
    #[arg(conflicts_with = "dir")]
    pub projects: Vec<PathBuf>,

    /// Compile every source below a directory instead of project files
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Define a preprocessor symbol (repeatable)
    #[arg(short = 'D', long = "define", value_name = "SYMBOL")]
    pub defines: Vec<String>,

    /// Name of the compilation
    #[arg(long)]
    pub name: Option<String>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Root project files
    #[arg(required = true)]
    pub projects: Vec<PathBuf>,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Repeat projects that were already shown
    #[arg(long)]
    pub duplicates: bool,
}
