//! `modlink verify` command

use anyhow::Result;

use crate::cli::VerifyArgs;
use crate::commands::GlobalArgs;
use modlink::core::ModuleRequest;
use modlink::ops::verify::{
    format_human, format_json, registration_warning, verify, VerifyOptions,
};
use modlink::util::shell::{Shell, Status};
use modlink::util::GlobalContext;

pub fn execute(
    args: VerifyArgs,
    global: &GlobalArgs,
    ctx: &GlobalContext,
    shell: &Shell,
) -> Result<()> {
    let request = if args.modules.is_empty() {
        ctx.config().request()
    } else {
        ModuleRequest::from_names(args.modules)
    };

    let options = VerifyOptions {
        graph: global.graph_path(ctx),
        map_file: match &args.map_file {
            Some(path) => ctx.resolve_arg(path),
            None => ctx.map_file(),
        },
        request,
        policy: global.module_policy(ctx),
        registration_marker: args
            .registration_marker
            .unwrap_or_else(|| ctx.config().registration_marker().to_string()),
    };

    shell.status(Status::Verifying, options.map_file.display());
    let report = verify(&options)?;

    if shell.is_json() {
        shell.json_event(&format_json(&report));
    } else {
        for line in format_human(&report) {
            shell.note(line);
        }
        if let Some(warning) = registration_warning(&report) {
            shell.warn(warning);
        }
    }

    report.ensure_complete()?;

    shell.status(
        Status::Linked,
        format!("all {} expected module(s) are in the image", report.expected.len()),
    );
    Ok(())
}
