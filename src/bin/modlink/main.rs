//! modlink CLI - include resolution and link verification for optional firmware modules

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, OutputFormat};
use modlink::core::{ConfigError, GraphError, VerifyError};
use modlink::util::diagnostic::{emit, suggestions, Diagnostic};
use modlink::util::{GlobalContext, Shell};

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("modlink=debug")
    } else {
        EnvFilter::new("modlink=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.format == OutputFormat::Json,
    );

    let ctx = match GlobalContext::new() {
        Ok(mut ctx) => {
            ctx.set_verbose(cli.verbose);
            ctx
        }
        Err(e) => {
            shell.error(format!("{:#}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, &ctx, &shell) {
        report(&e, &ctx, &shell);
        std::process::exit(1);
    }
}

fn run(cli: Cli, ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let global = commands::GlobalArgs {
        graph: cli.graph,
        modules_dir: cli.modules_dir,
    };

    match cli.command {
        Commands::Includes(args) => commands::includes::execute(args, &global, ctx, shell),
        Commands::Verify(args) => commands::verify::execute(args, &global, ctx, shell),
        Commands::Tree(args) => commands::tree::execute(args, &global, ctx, shell),
        Commands::Locate(args) => commands::locate::execute(args, &global, ctx, shell),
    }
}

/// Print an error, as a full diagnostic when it is one of ours.
fn report(error: &anyhow::Error, ctx: &GlobalContext, shell: &Shell) {
    if shell.is_json() {
        shell.error(format!("{:#}", error));
        return;
    }

    let diagnostic = if let Some(e) = error.downcast_ref::<VerifyError>() {
        Some(e.to_diagnostic())
    } else if let Some(e) = error.downcast_ref::<ConfigError>() {
        Some(e.to_diagnostic())
    } else if let Some(e) = error.downcast_ref::<GraphError>() {
        let diag = e.to_diagnostic();
        Some(match e {
            GraphError::Io { .. } if ctx.project_root().is_none() => {
                diag.with_suggestion(suggestions::NO_PROJECT)
            }
            _ => diag,
        })
    } else {
        None
    };

    match diagnostic {
        Some(diagnostic) => emit(&with_outer_context(diagnostic, error), shell.use_color()),
        None => eprintln!("error: {:#}", error),
    }
}

/// Keep the context layers anyhow added on top of the root error.
fn with_outer_context(mut diagnostic: Diagnostic, error: &anyhow::Error) -> Diagnostic {
    for outer in error
        .chain()
        .map(|e| e.to_string())
        .take_while(|message| *message != diagnostic.message)
        .collect::<Vec<_>>()
    {
        diagnostic = diagnostic.with_context(outer);
    }
    diagnostic
}
