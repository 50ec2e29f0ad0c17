//! Command implementations

pub mod includes;
pub mod locate;
pub mod tree;
pub mod verify;

use std::path::PathBuf;

use modlink::core::ModulePolicy;
use modlink::util::GlobalContext;

/// Flags shared by every command that override configuration.
#[derive(Debug, Default)]
pub struct GlobalArgs {
    pub graph: Option<PathBuf>,
    pub modules_dir: Option<PathBuf>,
}

impl GlobalArgs {
    /// Dependency graph file, from the flag or configuration.
    pub fn graph_path(&self, ctx: &GlobalContext) -> PathBuf {
        match &self.graph {
            Some(path) => ctx.resolve_arg(path),
            None => ctx.graph_path(),
        }
    }

    /// Module policy, with the modules root from the flag or configuration.
    pub fn module_policy(&self, ctx: &GlobalContext) -> ModulePolicy {
        match &self.modules_dir {
            Some(dir) => ctx.config().module_policy(ctx.resolve_arg(dir)),
            None => ctx.module_policy(),
        }
    }
}
