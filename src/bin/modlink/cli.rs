//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use modlink::util::shell::ColorChoice;

/// modlink - include resolution and link verification for optional firmware modules
#[derive(Parser)]
#[command(name = "modlink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_parser = parse_color)]
    pub color: ColorChoice,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Dependency graph file (overrides [build] graph)
    #[arg(long, global = true, env = "MODLINK_GRAPH")]
    pub graph: Option<PathBuf>,

    /// Modules directory (overrides [modules] dir)
    #[arg(long, global = true)]
    pub modules_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn parse_color(s: &str) -> Result<ColorChoice, String> {
    s.parse()
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the include search path of every module
    Includes(IncludesArgs),

    /// Check the linker map file for every requested module
    Verify(VerifyArgs),

    /// Display the dependency graph
    Tree(TreeArgs),

    /// Find module directories under the modules root
    Locate(LocateArgs),
}

#[derive(Args)]
pub struct IncludesArgs {
    /// Only show this module
    pub module: Option<String>,

    /// Project source root (overrides [project] src_dir)
    #[arg(long)]
    pub src_dir: Option<PathBuf>,

    /// Print the shared library include list instead of per-module paths
    #[arg(long)]
    pub shared: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Requested modules; `*` for every module (overrides [modules] request)
    pub modules: Vec<String>,

    /// Linker map file (defaults to <build_dir>/<program>.map)
    #[arg(long)]
    pub map_file: Option<PathBuf>,

    /// Registration table section name
    #[arg(long)]
    pub registration_marker: Option<String>,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Library to show tree for (defaults to the build roots)
    pub library: Option<String>,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Expand repeated subtrees
    #[arg(long)]
    pub duplicates: bool,
}

#[derive(Args)]
pub struct LocateArgs {
    /// Module names; `*` or nothing lists every module with a manifest
    pub modules: Vec<String>,
}
