//! Test utilities for modlink unit tests.
//!
//! Provides a terse builder for dependency graphs and canned map-file text.
//!
//! # Example
//!
//! ```rust,ignore
//! use modlink::test_support::GraphBuilder;
//!
//! let graph = GraphBuilder::new()
//!     .library("core", &["/core/include"], &["spi"])
//!     .library("spi", &[], &[])
//!     .module("audio", &[], &[])
//!     .roots(&["core", "audio"])
//!     .build();
//! ```

pub mod fixtures;

use std::path::PathBuf;

use crate::core::dependency::{DependencyGraph, DependencyNode};
use crate::core::module::ModulePolicy;

pub use fixtures::*;

/// Modules root used by [`GraphBuilder`] nodes.
pub const MODULES_ROOT: &str = "/project/modules";

/// Library install root used by [`GraphBuilder`] nodes.
pub const LIBDEPS_ROOT: &str = "/project/libdeps";

/// Build-output root used by [`GraphBuilder`] nodes.
pub const BUILD_ROOT: &str = "/project/build";

/// Declarative dependency graph builder.
///
/// Nodes may reference dependencies declared later; edges are wired in
/// [`GraphBuilder::build`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<(DependencyNode, Vec<String>)>,
    roots: Vec<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classification policy matching the paths the builder generates.
    pub fn policy() -> ModulePolicy {
        ModulePolicy::new(MODULES_ROOT)
    }

    /// Add an ordinary library under the libdeps root.
    pub fn library(self, name: &str, includes: &[&str], deps: &[&str]) -> Self {
        let node = DependencyNode::new(name, PathBuf::from(LIBDEPS_ROOT).join(name));
        self.node(node, includes, deps)
    }

    /// Add a module under the modules root.
    pub fn module(self, name: &str, includes: &[&str], deps: &[&str]) -> Self {
        let node = DependencyNode::new(name, PathBuf::from(MODULES_ROOT).join(name))
            .with_build_dir(PathBuf::from(BUILD_ROOT).join(name));
        self.node(node, includes, deps)
    }

    /// Add a module built as a static archive.
    pub fn archived_module(self, name: &str) -> Self {
        let node = DependencyNode::new(name, PathBuf::from(MODULES_ROOT).join(name))
            .with_build_dir(PathBuf::from(BUILD_ROOT).join(name))
            .archived();
        self.node(node, &[], &[])
    }

    /// Add a fully specified node.
    pub fn node(mut self, mut node: DependencyNode, includes: &[&str], deps: &[&str]) -> Self {
        node.include_dirs
            .extend(includes.iter().map(PathBuf::from));
        self.nodes
            .push((node, deps.iter().map(|d| d.to_string()).collect()));
        self
    }

    /// Set the root dependencies of the main build.
    pub fn roots(mut self, roots: &[&str]) -> Self {
        self.roots = roots.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Assemble the graph. Panics on unknown names, which is a test bug.
    pub fn build(self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let mut edges = Vec::new();
        for (node, deps) in self.nodes {
            let id = graph.add_node(node).expect("duplicate node in fixture");
            edges.push((id, deps));
        }
        for (id, deps) in edges {
            for dep in deps {
                let target = graph
                    .find(&dep)
                    .unwrap_or_else(|| panic!("unknown dependency `{}` in fixture", dep));
                graph.add_dependency(id, target);
            }
        }
        for root in self.roots {
            let id = graph
                .find(&root)
                .unwrap_or_else(|| panic!("unknown root `{}` in fixture", root));
            graph.add_root(id);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::module::ModuleClassifier;

    #[test]
    fn test_graph_builder_wires_forward_references() {
        let graph = GraphBuilder::new()
            .library("a", &["/a"], &["b"])
            .module("b", &[], &[])
            .roots(&["a"])
            .build();

        let a = graph.find("a").unwrap();
        let b = graph.find("b").unwrap();
        assert_eq!(graph.children(a), vec![b]);
        assert!(GraphBuilder::policy().is_module(graph.node(b)));
        assert!(!GraphBuilder::policy().is_module(graph.node(a)));
    }
}
