//! The dependency graph handed over by the surrounding build system.
//!
//! The graph is read-only to everything downstream of loading. It is a DAG in
//! practice (libraries shared by several parents) but cycles are tolerated;
//! traversals guard themselves with a visited set.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;
use crate::util::fs::{dir_name, resolve_against};

/// Identity of a node within one [`DependencyGraph`].
pub type NodeId = NodeIndex;

/// Errors raised while loading or assembling a dependency graph.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GraphError {
    #[error("failed to read dependency graph `{}`", .path.display())]
    #[diagnostic(code(modlink::graph::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dependency graph `{}`: {message}", .path.display())]
    #[diagnostic(code(modlink::graph::parse))]
    Parse { path: PathBuf, message: String },

    #[error("library `{name}` is declared more than once")]
    #[diagnostic(code(modlink::graph::duplicate))]
    DuplicateNode { name: String },

    #[error("library `{node}` depends on unknown library `{dep}`")]
    #[diagnostic(code(modlink::graph::unknown_dependency))]
    UnknownDependency { node: String, dep: String },

    #[error("root dependency `{name}` is not declared")]
    #[diagnostic(code(modlink::graph::unknown_root))]
    UnknownRoot { name: String },
}

impl GraphError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            GraphError::Io { path, source } => diag
                .with_location(path)
                .with_context(source.to_string())
                .with_suggestion("Export the dependency graph from the build before running modlink"),
            GraphError::Parse { path, .. } => diag.with_location(path),
            GraphError::DuplicateNode { .. } => {
                diag.with_suggestion("Give every [[node]] entry a unique name")
            }
            GraphError::UnknownDependency { dep, .. } => {
                diag.with_suggestion(format!("Declare `{}` as a [[node]] entry", dep))
            }
            GraphError::UnknownRoot { name } => {
                diag.with_suggestion(format!("Declare `{}` as a [[node]] entry", name))
            }
        }
    }
}

/// One library or module in the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    /// Unique library name
    pub name: String,
    /// Source directory
    pub src_dir: PathBuf,
    /// Build-output directory holding the library's object files
    pub build_dir: Option<PathBuf>,
    /// Include directories the library exposes, in declared order
    pub include_dirs: Vec<PathBuf>,
    /// Objects are batched into a static archive instead of linked directly
    pub archive: bool,
    /// Whether the library supports the current platform
    pub compatible: bool,
}

impl DependencyNode {
    /// Create a node with no include directories.
    pub fn new(name: impl Into<String>, src_dir: impl Into<PathBuf>) -> Self {
        DependencyNode {
            name: name.into(),
            src_dir: src_dir.into(),
            build_dir: None,
            include_dirs: Vec::new(),
            archive: false,
            compatible: true,
        }
    }

    /// Add an exposed include directory.
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Set the build-output directory.
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    /// Mark the node as built into a static archive.
    pub fn archived(mut self) -> Self {
        self.archive = true;
        self
    }

    /// Mark the node as unsupported on the current platform.
    pub fn incompatible(mut self) -> Self {
        self.compatible = false;
        self
    }

    /// Directory the node's object files land in.
    pub fn build_dir(&self) -> &Path {
        self.build_dir.as_deref().unwrap_or(&self.src_dir)
    }

    /// Base name of the build-output directory, as it appears in map files.
    pub fn output_dir_name(&self) -> String {
        dir_name(self.build_dir())
    }
}

/// The dependency graph of the main build target.
///
/// Edges point from a library to its dependencies; edge weights record the
/// declaration order so children are always visited as declared.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, usize>,
    by_name: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Names must be unique.
    pub fn add_node(&mut self, node: DependencyNode) -> Result<NodeId, GraphError> {
        if self.by_name.contains_key(&node.name) {
            return Err(GraphError::DuplicateNode { name: node.name });
        }
        let name = node.name.clone();
        let id = self.graph.add_node(node);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Record that `from` depends on `to`. Repeated edges are ignored.
    pub fn add_dependency(&mut self, from: NodeId, to: NodeId) {
        if self.graph.contains_edge(from, to) {
            return;
        }
        let order = self.graph.edges(from).count();
        self.graph.add_edge(from, to, order);
    }

    /// Append a root dependency of the main build target.
    pub fn add_root(&mut self, id: NodeId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    /// Root dependencies in declared order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.graph[id]
    }

    /// Look up a node by name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Direct dependencies of a node, in declared order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut edges: Vec<_> = self
            .graph
            .edges(id)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        edges.sort_by_key(|(order, _)| *order);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Iterate over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DependencyNode)> {
        self.graph
            .node_indices()
            .map(move |id| (id, &self.graph[id]))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether any dependency cycle exists.
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Every node reachable from the roots through any edge, in depth-first
    /// pre-order. Each node appears once.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            for child in self.children(id).into_iter().rev() {
                if !seen.contains(&child) {
                    stack.push(child);
                }
            }
        }

        order
    }

    /// Load a graph file. `.json` files are read as JSON, everything else as TOML.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_err = |message: String| GraphError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let file: GraphFile = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?
        } else {
            toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let graph = file.into_graph(base)?;
        tracing::debug!(
            "loaded dependency graph with {} libraries and {} roots from {}",
            graph.len(),
            graph.roots().len(),
            path.display()
        );
        Ok(graph)
    }
}

/// On-disk form of the dependency graph.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphFile {
    #[serde(default)]
    roots: Vec<String>,
    #[serde(default, rename = "node")]
    nodes: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeSpec {
    name: String,
    src_dir: PathBuf,
    #[serde(default)]
    build_dir: Option<PathBuf>,
    #[serde(default)]
    include_dirs: Vec<PathBuf>,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    archive: bool,
    #[serde(default = "default_compatible")]
    compatible: bool,
}

fn default_compatible() -> bool {
    true
}

impl GraphFile {
    fn into_graph(self, base: &Path) -> Result<DependencyGraph, GraphError> {
        let mut graph = DependencyGraph::new();
        let mut edges = Vec::new();

        for spec in self.nodes {
            let node = DependencyNode {
                name: spec.name,
                src_dir: resolve_against(base, &spec.src_dir),
                build_dir: spec.build_dir.map(|dir| resolve_against(base, &dir)),
                include_dirs: spec
                    .include_dirs
                    .iter()
                    .map(|dir| resolve_against(base, dir))
                    .collect(),
                archive: spec.archive,
                compatible: spec.compatible,
            };
            let name = node.name.clone();
            let id = graph.add_node(node)?;
            edges.push((id, name, spec.deps));
        }

        for (id, name, deps) in edges {
            for dep in deps {
                let target = graph.find(&dep).ok_or_else(|| GraphError::UnknownDependency {
                    node: name.clone(),
                    dep: dep.clone(),
                })?;
                graph.add_dependency(id, target);
            }
        }

        for root in self.roots {
            let id = graph
                .find(&root)
                .ok_or(GraphError::UnknownRoot { name: root })?;
            graph.add_root(id);
        }

        Ok(graph)
    }
}
