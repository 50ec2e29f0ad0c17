//! `modlink locate` command

use anyhow::Result;

use crate::cli::LocateArgs;
use crate::commands::GlobalArgs;
use modlink::core::ModuleRequest;
use modlink::util::shell::{Shell, Status};
use modlink::util::GlobalContext;

pub fn execute(
    args: LocateArgs,
    global: &GlobalArgs,
    ctx: &GlobalContext,
    shell: &Shell,
) -> Result<()> {
    let policy = global.module_policy(ctx);

    let names = match ModuleRequest::from_names(args.modules) {
        ModuleRequest::All => policy.discover(),
        ModuleRequest::Named(names) if names.is_empty() => policy.discover(),
        ModuleRequest::Named(names) => names,
    };

    let mut located = Vec::with_capacity(names.len());
    for name in names {
        let dir = policy.locate(&name)?;
        located.push((name, dir));
    }

    if shell.is_json() {
        let modules: Vec<_> = located
            .iter()
            .map(|(name, dir)| serde_json::json!({ "name": name, "dir": dir }))
            .collect();
        shell.json_event(&serde_json::json!({
            "reason": "modules-located",
            "root": policy.root(),
            "modules": modules,
        }));
        return Ok(());
    }

    if located.is_empty() {
        shell.status(
            Status::Skipped,
            format!("no modules found under {}", policy.root().display()),
        );
    }
    for (name, dir) in &located {
        shell.print(format!("{}\t{}", name, dir.display()));
    }
    shell.status(Status::Located, format!("{} module(s)", located.len()));
    Ok(())
}
