//! Include directory resolution for module compilation units.
//!
//! Libraries pull in the include directories of their transitive dependencies.
//! Modules are leaves: their own dependencies never leak into the shared
//! include list, and every module compiles against the project source root plus
//! the shared list.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::dependency::{DependencyGraph, NodeId};
use crate::core::errors::ConfigError;
use crate::core::module::ModuleClassifier;

/// Ordered, duplicate-free list of include directories.
///
/// New directories are prepended, so the most recently discovered dependency
/// comes first in compiler search order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IncludeSet {
    dirs: VecDeque<PathBuf>,
    #[serde(skip)]
    seen: HashSet<PathBuf>,
}

impl IncludeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set that keeps the given order, dropping repeats.
    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut set = IncludeSet::new();
        for dir in dirs {
            let dir = dir.into();
            if set.seen.insert(dir.clone()) {
                set.dirs.push_back(dir);
            }
        }
        set
    }

    /// Prepend `dir` unless it is already present. Returns whether it was added.
    pub fn prepend_unique(&mut self, dir: impl Into<PathBuf>) -> bool {
        let dir = dir.into();
        if self.seen.contains(&dir) {
            return false;
        }
        self.seen.insert(dir.clone());
        self.dirs.push_front(dir);
        true
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.seen.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Directories in compiler search order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.dirs.iter().cloned().collect()
    }

    /// `-I` flags in search order.
    pub fn to_flags(&self) -> Vec<String> {
        self.dirs
            .iter()
            .map(|dir| format!("-I{}", dir.display()))
            .collect()
    }
}

/// Depth-first walk that collects library include directories.
struct IncludeWalk<'a, C: ModuleClassifier + ?Sized> {
    graph: &'a DependencyGraph,
    classifier: &'a C,
    visited: HashSet<NodeId>,
    includes: IncludeSet,
}

impl<C: ModuleClassifier + ?Sized> IncludeWalk<'_, C> {
    fn visit(&mut self, id: NodeId) {
        if !self.visited.insert(id) {
            return;
        }

        // a module's own dirs only reach its own search path
        let node = self.graph.node(id);
        if self.classifier.is_module(node) {
            tracing::trace!("not descending into module `{}`", node.name);
            return;
        }

        for dir in &node.include_dirs {
            self.includes.prepend_unique(dir.clone());
        }
        for child in self.graph.children(id) {
            self.visit(child);
        }
    }
}

/// Collect the include directories exposed by the libraries reachable from
/// `roots`, skipping modules and everything below them.
///
/// Every node is processed at most once, so shared subtrees and cycles are
/// fine.
pub fn resolve_includes<C>(graph: &DependencyGraph, roots: &[NodeId], classifier: &C) -> IncludeSet
where
    C: ModuleClassifier + ?Sized,
{
    resolve_with_visits(graph, roots, classifier).0
}

fn resolve_with_visits<C>(
    graph: &DependencyGraph,
    roots: &[NodeId],
    classifier: &C,
) -> (IncludeSet, usize)
where
    C: ModuleClassifier + ?Sized,
{
    let mut walk = IncludeWalk {
        graph,
        classifier,
        visited: HashSet::new(),
        includes: IncludeSet::new(),
    };
    for &root in roots {
        walk.visit(root);
    }
    (walk.includes, walk.visited.len())
}

/// Include directories for one module compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleIncludes {
    /// Library name of the module
    pub module: String,
    /// Search order for the module's sources
    pub include_dirs: Vec<PathBuf>,
}

impl ModuleIncludes {
    /// `-I` flags in search order.
    pub fn to_flags(&self) -> Vec<String> {
        self.include_dirs
            .iter()
            .map(|dir| format!("-I{}", dir.display()))
            .collect()
    }
}

/// Outcome of include resolution for the whole build.
#[derive(Debug, Clone, Serialize)]
pub struct IncludeResolution {
    /// Library include directories shared with every module
    pub includes: IncludeSet,
    /// Per-module search paths, in traversal order
    pub modules: Vec<ModuleIncludes>,
    /// Number of nodes processed by the include walk
    pub visited: usize,
}

/// Resolve the shared include list and the search path of every module.
///
/// Each module starts from its own include directories; the project source
/// root and then every shared directory are prepended unless already present.
/// Fails if any module is built as a static archive, since its objects could
/// be discarded by the linker.
pub fn resolve_module_includes<C>(
    graph: &DependencyGraph,
    classifier: &C,
    project_src: &Path,
) -> Result<IncludeResolution, ConfigError>
where
    C: ModuleClassifier + ?Sized,
{
    if graph.is_cyclic() {
        tracing::debug!("dependency graph contains a cycle");
    }

    let (includes, visited) = resolve_with_visits(graph, graph.roots(), classifier);
    tracing::debug!(
        "{} shared include dirs from {} of {} libraries",
        includes.len(),
        visited,
        graph.len()
    );

    let module_ids: Vec<NodeId> = graph
        .reachable()
        .into_iter()
        .filter(|&id| classifier.is_module(graph.node(id)))
        .collect();

    let archived: Vec<String> = module_ids
        .iter()
        .map(|&id| graph.node(id))
        .filter(|node| node.archive)
        .map(|node| node.name.clone())
        .collect();
    if !archived.is_empty() {
        return Err(ConfigError::ArchivedModules { modules: archived });
    }

    let modules = module_ids
        .into_iter()
        .map(|id| {
            let node = graph.node(id);
            let mut search = IncludeSet::from_dirs(node.include_dirs.iter().cloned());
            search.prepend_unique(project_src);
            for dir in includes.iter() {
                search.prepend_unique(dir);
            }
            tracing::debug!("module `{}`: {} include dirs", node.name, search.len());
            ModuleIncludes {
                module: node.name.clone(),
                include_dirs: search.to_vec(),
            }
        })
        .collect();

    Ok(IncludeResolution {
        includes,
        modules,
        visited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::DependencyNode;
    use crate::core::module::ModulePolicy;
    use crate::test_support::GraphBuilder;

    fn paths(dirs: &[&str]) -> Vec<PathBuf> {
        dirs.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_include_set_prepends_and_dedups() {
        let mut set = IncludeSet::new();
        assert!(set.prepend_unique("/a"));
        assert!(set.prepend_unique("/b"));
        assert!(!set.prepend_unique("/a"));

        assert_eq!(set.to_vec(), paths(&["/b", "/a"]));
        assert_eq!(set.to_flags(), vec!["-I/b", "-I/a"]);
        assert!(set.contains(Path::new("/a")));

        let kept = IncludeSet::from_dirs(["/x", "/y", "/x"]);
        assert_eq!(kept.to_vec(), paths(&["/x", "/y"]));
    }

    #[test]
    fn test_later_discoveries_come_first() {
        let graph = GraphBuilder::new()
            .library("core", &["/core/inc"], &["spi", "wire"])
            .library("spi", &["/spi/inc"], &[])
            .library("wire", &["/wire/inc"], &[])
            .roots(&["core"])
            .build();

        let includes = resolve_includes(&graph, graph.roots(), &GraphBuilder::policy());
        assert_eq!(includes.to_vec(), paths(&["/wire/inc", "/spi/inc", "/core/inc"]));
    }

    #[test]
    fn test_shared_subtree_visited_once() {
        // a -> {b, c}, b -> d, c -> d, d -> e
        let graph = GraphBuilder::new()
            .library("a", &["/a"], &["b", "c"])
            .library("b", &["/b", "/shared"], &["d"])
            .library("c", &["/c", "/shared"], &["d"])
            .library("d", &["/d"], &["e"])
            .library("e", &["/e"], &[])
            .roots(&["a", "c"])
            .build();

        let (includes, visits) =
            resolve_with_visits(&graph, graph.roots(), &GraphBuilder::policy());
        assert!(visits <= graph.len());
        assert_eq!(visits, 5);
        assert_eq!(includes.len(), 6);
        assert_eq!(includes.iter().filter(|d| *d == Path::new("/shared")).count(), 1);
    }

    #[test]
    fn test_duplicate_dir_keeps_first_position() {
        let graph = GraphBuilder::new()
            .library("a", &["/common"], &[])
            .library("b", &["/b"], &[])
            .library("c", &["/common", "/c"], &[])
            .roots(&["a", "b", "c"])
            .build();

        let includes = resolve_includes(&graph, graph.roots(), &GraphBuilder::policy());
        assert_eq!(includes.to_vec(), paths(&["/c", "/b", "/common"]));
    }

    #[test]
    fn test_cycle_terminates() {
        let graph = GraphBuilder::new()
            .library("a", &["/a"], &["b"])
            .library("b", &["/b"], &["c"])
            .library("c", &["/c"], &["a"])
            .roots(&["a", "b"])
            .build();

        let (includes, visits) =
            resolve_with_visits(&graph, graph.roots(), &GraphBuilder::policy());
        assert_eq!(visits, 3);
        assert_eq!(includes.to_vec(), paths(&["/c", "/b", "/a"]));
    }

    #[test]
    fn test_module_children_never_contribute() {
        let graph = GraphBuilder::new()
            .library("core", &["/core"], &[])
            .module("audio", &["/m/audio/inc"], &["fft", "inner"])
            .library("fft", &["/fft"], &[])
            .module("inner", &["/m/inner/inc"], &[])
            .roots(&["core", "audio"])
            .build();

        let includes = resolve_includes(&graph, graph.roots(), &GraphBuilder::policy());
        assert_eq!(includes.to_vec(), paths(&["/core"]));
        assert!(!includes.contains(Path::new("/m/audio/inc")));
        assert!(!includes.contains(Path::new("/m/inner/inc")));
    }

    #[test]
    fn test_module_own_dirs_stay_out_of_shared_list() {
        let graph = GraphBuilder::new()
            .module("audio", &["/m/audio/inc"], &[])
            .roots(&["audio"])
            .build();

        let resolution =
            resolve_module_includes(&graph, &GraphBuilder::policy(), Path::new("/src")).unwrap();
        assert!(resolution.includes.is_empty());
        assert_eq!(resolution.visited, 1);
        assert_eq!(
            resolution.modules[0].include_dirs,
            paths(&["/src", "/m/audio/inc"])
        );
    }

    #[test]
    fn test_library_shared_with_module_still_included() {
        // fft is reached through the module first, but the library path
        // still pulls it in
        let graph = GraphBuilder::new()
            .module("audio", &[], &["fft"])
            .library("dsp", &["/dsp"], &["fft"])
            .library("fft", &["/fft"], &[])
            .roots(&["audio", "dsp"])
            .build();

        let includes = resolve_includes(&graph, graph.roots(), &GraphBuilder::policy());
        assert_eq!(includes.to_vec(), paths(&["/fft", "/dsp"]));
    }

    #[test]
    fn test_modules_do_not_see_each_other() {
        // M1 -> L1, M2 -> L2; the project itself uses L1 and L2 as well
        let graph = GraphBuilder::new()
            .module("m1", &["/m/m1/inc"], &["l1"])
            .module("m2", &["/m/m2/inc"], &["l2"])
            .library("l1", &["/l1"], &[])
            .library("l2", &["/l2"], &[])
            .roots(&["m1", "m2", "l1", "l2"])
            .build();

        let resolution =
            resolve_module_includes(&graph, &GraphBuilder::policy(), Path::new("/project/src"))
                .unwrap();

        assert!(resolution.includes.contains(Path::new("/l1")));
        assert!(resolution.includes.contains(Path::new("/l2")));
        assert!(!resolution.includes.contains(Path::new("/m/m1/inc")));
        assert!(!resolution.includes.contains(Path::new("/m/m2/inc")));

        let m1 = &resolution.modules[0];
        assert_eq!(m1.module, "m1");
        assert_eq!(
            m1.include_dirs,
            paths(&["/l1", "/l2", "/project/src", "/m/m1/inc"])
        );
        assert!(!m1.include_dirs.contains(&PathBuf::from("/m/m2/inc")));

        let m2 = &resolution.modules[1];
        assert!(!m2.include_dirs.contains(&PathBuf::from("/m/m1/inc")));
        assert!(m2.include_dirs.contains(&PathBuf::from("/project/src")));
    }

    #[test]
    fn test_nested_modules_get_search_paths() {
        let graph = GraphBuilder::new()
            .module("outer", &[], &["inner"])
            .module("inner", &[], &[])
            .roots(&["outer"])
            .build();

        let resolution =
            resolve_module_includes(&graph, &GraphBuilder::policy(), Path::new("/src")).unwrap();
        let names: Vec<_> = resolution.modules.iter().map(|m| m.module.as_str()).collect();
        assert_eq!(names, vec!["outer", "inner"]);
        assert_eq!(resolution.modules[1].to_flags(), vec!["-I/src"]);
    }

    #[test]
    fn test_archived_modules_are_fatal() {
        let graph = GraphBuilder::new()
            .library("core", &["/core"], &["fan"])
            .archived_module("fan")
            .archived_module("audio")
            .module("rotary", &[], &[])
            .roots(&["core", "audio", "rotary"])
            .build();

        let err = resolve_module_includes(&graph, &GraphBuilder::policy(), Path::new("/src"))
            .unwrap_err();
        match err {
            ConfigError::ArchivedModules { modules } => {
                assert_eq!(modules, vec!["fan".to_string(), "audio".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_archived_library_is_fine() {
        let mut graph = DependencyGraph::new();
        let lib = graph
            .add_node(DependencyNode::new("spi", "/libs/spi").archived())
            .unwrap();
        graph.add_root(lib);

        let resolution =
            resolve_module_includes(&graph, &ModulePolicy::new("/modules"), Path::new("/src"))
                .unwrap();
        assert!(resolution.modules.is_empty());
        assert_eq!(resolution.visited, 1);
    }

    #[test]
    fn test_closure_classifier_is_accepted() {
        let graph = GraphBuilder::new()
            .library("a", &["/a"], &["b"])
            .library("b", &["/b"], &[])
            .roots(&["a"])
            .build();

        let everything_is_module = |_: &DependencyNode| true;
        let includes = resolve_includes(&graph, graph.roots(), &everything_is_module);
        assert!(includes.is_empty());
    }
}
