//! `modlink includes` command

use anyhow::Result;

use crate::cli::IncludesArgs;
use crate::commands::GlobalArgs;
use modlink::ops::includes::{format_human, format_json, includes, IncludesOptions};
use modlink::util::shell::{Shell, Status};
use modlink::util::GlobalContext;

pub fn execute(
    args: IncludesArgs,
    global: &GlobalArgs,
    ctx: &GlobalContext,
    shell: &Shell,
) -> Result<()> {
    let options = IncludesOptions {
        graph: global.graph_path(ctx),
        project_src: match &args.src_dir {
            Some(dir) => ctx.resolve_arg(dir),
            None => ctx.project_src(),
        },
        policy: global.module_policy(ctx),
        module: args.module,
    };

    shell.status(
        Status::Resolving,
        format!("include paths from {}", options.graph.display()),
    );
    let resolution = includes(&options)?;

    if shell.is_json() {
        shell.json_event(&format_json(&resolution));
        return Ok(());
    }

    if args.shared {
        for flag in resolution.includes.to_flags() {
            shell.print(flag);
        }
    } else {
        for line in format_human(&resolution) {
            shell.print(line);
        }
    }

    shell.status(
        Status::Finished,
        format!(
            "{} module(s), {} shared include dir(s), {} libraries visited",
            resolution.modules.len(),
            resolution.includes.len(),
            resolution.visited
        ),
    );
    Ok(())
}
