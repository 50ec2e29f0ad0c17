//! `modlink tree` command

use std::collections::HashSet;

use anyhow::{anyhow, Result};

use crate::cli::TreeArgs;
use crate::commands::GlobalArgs;
use modlink::core::{DependencyGraph, ModuleClassifier, ModulePolicy, NodeId};
use modlink::util::shell::Shell;
use modlink::util::GlobalContext;

pub fn execute(
    args: TreeArgs,
    global: &GlobalArgs,
    ctx: &GlobalContext,
    shell: &Shell,
) -> Result<()> {
    let graph = DependencyGraph::load(&global.graph_path(ctx))?;
    let policy = global.module_policy(ctx);

    let starts: Vec<NodeId> = match &args.library {
        Some(name) => vec![graph
            .find(name)
            .ok_or_else(|| anyhow!("library `{}` is not in the dependency graph", name))?],
        None => graph.roots().to_vec(),
    };

    if shell.is_json() {
        shell.json_event(&tree_json(&graph, &policy));
        return Ok(());
    }

    let printer = TreePrinter {
        graph: &graph,
        policy: &policy,
        max_depth: args.depth.unwrap_or(usize::MAX),
        show_duplicates: args.duplicates,
    };
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for id in starts {
        printer.print(id, 0, &mut seen, &mut Vec::new(), &mut lines);
    }
    for line in lines {
        shell.print(line);
    }

    Ok(())
}

struct TreePrinter<'a> {
    graph: &'a DependencyGraph,
    policy: &'a ModulePolicy,
    max_depth: usize,
    show_duplicates: bool,
}

impl TreePrinter<'_> {
    fn print(
        &self,
        id: NodeId,
        depth: usize,
        seen: &mut HashSet<NodeId>,
        path: &mut Vec<NodeId>,
        out: &mut Vec<String>,
    ) {
        if depth > self.max_depth {
            return;
        }

        let is_duplicate = !seen.insert(id);
        let is_cycle = path.contains(&id);
        let node = self.graph.node(id);

        let prefix = if depth == 0 {
            String::new()
        } else {
            format!("{}├── ", "│   ".repeat(depth - 1))
        };

        let mut tags = Vec::new();
        if self.policy.is_module(node) {
            tags.push("module");
        }
        if node.archive {
            tags.push("archive");
        }
        if !node.compatible {
            tags.push("incompatible");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };

        let dup_marker = if is_duplicate && (!self.show_duplicates || is_cycle) {
            " (*)"
        } else {
            ""
        };

        out.push(format!("{}{}{}{}", prefix, node.name, tags, dup_marker));

        // Cycles always stop at the repeated node.
        if is_cycle || (is_duplicate && !self.show_duplicates) {
            return;
        }

        path.push(id);
        for child in self.graph.children(id) {
            self.print(child, depth + 1, seen, path, out);
        }
        path.pop();
    }
}

fn tree_json(graph: &DependencyGraph, policy: &ModulePolicy) -> serde_json::Value {
    let nodes: Vec<_> = graph
        .nodes()
        .map(|(id, node)| {
            serde_json::json!({
                "name": node.name,
                "module": policy.is_module(node),
                "archive": node.archive,
                "compatible": node.compatible,
                "deps": graph
                    .children(id)
                    .into_iter()
                    .map(|child| graph.node(child).name.clone())
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    let roots: Vec<_> = graph
        .roots()
        .iter()
        .map(|&id| graph.node(id).name.clone())
        .collect();

    serde_json::json!({
        "reason": "dependency-tree",
        "roots": roots,
        "nodes": nodes,
    })
}
