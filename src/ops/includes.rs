//! `modlink includes` operation.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::include_resolver::{resolve_module_includes, IncludeResolution};
use crate::core::dependency::DependencyGraph;
use crate::core::module::ModulePolicy;

/// Options for [`includes`].
#[derive(Debug, Clone)]
pub struct IncludesOptions {
    /// Dependency graph exported by the build
    pub graph: PathBuf,
    /// Source root of the main project
    pub project_src: PathBuf,
    /// Module classification
    pub policy: ModulePolicy,
    /// Only report this module
    pub module: Option<String>,
}

/// Load the graph and compute the include search path of every module.
pub fn includes(options: &IncludesOptions) -> Result<IncludeResolution> {
    let graph = DependencyGraph::load(&options.graph)?;

    let mut resolution = resolve_module_includes(&graph, &options.policy, &options.project_src)
        .with_context(|| format!("failed to resolve includes from {}", options.graph.display()))?;

    if let Some(module) = &options.module {
        resolution.modules.retain(|m| &m.module == module);
        if resolution.modules.is_empty() {
            anyhow::bail!("`{}` is not a module reachable from the build roots", module);
        }
    }

    Ok(resolution)
}

/// Human-readable listing: one header per module followed by its flags.
pub fn format_human(resolution: &IncludeResolution) -> Vec<String> {
    let mut lines = Vec::new();
    for module in &resolution.modules {
        lines.push(format!("{}:", module.module));
        lines.extend(module.to_flags().into_iter().map(|flag| format!("  {}", flag)));
    }
    lines
}

/// Machine-readable resolution event.
pub fn format_json(resolution: &IncludeResolution) -> serde_json::Value {
    serde_json::json!({
        "reason": "includes-resolved",
        "shared": resolution.includes,
        "modules": resolution.modules,
        "visited": resolution.visited,
    })
}
