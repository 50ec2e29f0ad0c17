//! Assembly of the module set a linked image must contain.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::dependency::DependencyGraph;
use crate::core::errors::ConfigError;
use crate::core::module::{ExpectedModule, ModuleClassifier, ModulePolicy, ModuleRequest};
use crate::util::fs::dir_name;

/// Deduplicated expected modules, in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpectedModules {
    modules: Vec<ExpectedModule>,
    requested: usize,
}

impl ExpectedModules {
    /// Collect modules, keeping the first entry per library.
    ///
    /// Two different libraries whose build directories share a base name
    /// cannot be told apart in a map file, so that is rejected.
    pub fn new(modules: Vec<ExpectedModule>, requested: usize) -> Result<Self, ConfigError> {
        let mut unique: Vec<ExpectedModule> = Vec::with_capacity(modules.len());
        for module in modules {
            if !unique.iter().any(|m| m.library == module.library) {
                unique.push(module);
            }
        }

        let mut by_dir: HashMap<&str, Vec<&str>> = HashMap::new();
        for module in &unique {
            by_dir
                .entry(module.dir_name.as_str())
                .or_default()
                .push(module.name.as_str());
        }
        if let Some(first) = unique.iter().find(|m| by_dir[m.dir_name.as_str()].len() > 1) {
            return Err(ConfigError::DirectoryCollision {
                dir_name: first.dir_name.clone(),
                modules: by_dir[first.dir_name.as_str()]
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            });
        }

        Ok(ExpectedModules {
            modules: unique,
            requested,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExpectedModule> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of distinct modules the project asked for.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Build-output directory names to look for in the map file.
    pub fn dir_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.dir_name.as_str()).collect()
    }

    /// Requested names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Map a module request onto nodes of the dependency graph.
///
/// `*` selects every module node that supports the platform. Named modules
/// are located under the modules root and must match exactly one module
/// node by source directory; a named module that does not support the platform is
/// an error.
pub fn expected_modules(
    graph: &DependencyGraph,
    policy: &ModulePolicy,
    request: &ModuleRequest,
) -> Result<ExpectedModules, ConfigError> {
    match request {
        ModuleRequest::All => {
            let modules: Vec<ExpectedModule> = graph
                .nodes()
                .map(|(_, node)| node)
                .filter(|node| policy.is_module(node))
                .filter(|node| {
                    if !node.compatible {
                        tracing::debug!("skipping incompatible module `{}`", node.name);
                    }
                    node.compatible
                })
                .map(|node| ExpectedModule::new(node.name.clone(), node))
                .collect();
            let requested = modules.len();
            ExpectedModules::new(modules, requested)
        }
        ModuleRequest::Named(names) => {
            let mut modules = Vec::with_capacity(names.len());
            let mut incompatible = Vec::new();

            for name in names {
                let located = policy.locate(name)?;
                let located_name = dir_name(&located);
                tracing::debug!("module `{}` located at {}", name, located.display());

                let candidates: Vec<_> = graph
                    .nodes()
                    .filter(|(_, node)| policy.is_module(node))
                    .filter(|(_, node)| {
                        node.src_dir.starts_with(&located) || dir_name(&node.src_dir) == located_name
                    })
                    .map(|(_, node)| node)
                    .collect();

                let node = match candidates.as_slice() {
                    [node] => *node,
                    [] => {
                        return Err(ConfigError::ModuleNotInGraph {
                            name: name.clone(),
                            dir: located_name,
                        })
                    }
                    many => {
                        return Err(ConfigError::AmbiguousModule {
                            name: name.clone(),
                            dir: located_name,
                            candidates: many.iter().map(|node| node.name.clone()).collect(),
                        })
                    }
                };

                if !node.compatible {
                    incompatible.push(name.clone());
                }
                modules.push(ExpectedModule::new(name.clone(), node));
            }

            if !incompatible.is_empty() {
                return Err(ConfigError::IncompatibleModules {
                    modules: incompatible,
                });
            }
            ExpectedModules::new(modules, names.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::DependencyNode;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn module_node(modules: &Path, dir: &str, build: &str) -> DependencyNode {
        DependencyNode::new(dir, modules.join(dir)).with_build_dir(format!("/build/{}", build))
    }

    fn setup(dirs: &[&str]) -> (TempDir, ModulePolicy) {
        let tmp = TempDir::new().unwrap();
        for dir in dirs {
            fs::create_dir_all(tmp.path().join("modules").join(dir)).unwrap();
            fs::write(tmp.path().join("modules").join(dir).join("library.json"), "{}").unwrap();
        }
        let policy = ModulePolicy::new(tmp.path().join("modules"));
        (tmp, policy)
    }

    fn graph(nodes: Vec<DependencyNode>) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for node in nodes {
            let id = graph.add_node(node).unwrap();
            graph.add_root(id);
        }
        graph
    }

    #[test]
    fn test_named_modules_map_to_nodes() {
        let (_tmp, policy) = setup(&["audio_reactive", "usermod_v2_fan"]);
        let graph = graph(vec![
            module_node(policy.root(), "audio_reactive", "audio_reactive"),
            module_node(policy.root(), "usermod_v2_fan", "usermod_v2_fan"),
            DependencyNode::new("FastLED", "/libdeps/FastLED"),
        ]);

        let request = ModuleRequest::parse("fan audio_reactive fan");
        let expected = expected_modules(&graph, &policy, &request).unwrap();

        assert_eq!(expected.requested(), 2);
        assert_eq!(expected.names(), vec!["fan", "audio_reactive"]);
        assert_eq!(expected.dir_names(), vec!["usermod_v2_fan", "audio_reactive"]);
    }

    #[test]
    fn test_unknown_module_directory() {
        let (_tmp, policy) = setup(&[]);
        let err = expected_modules(&graph(vec![]), &policy, &ModuleRequest::parse("ghost"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ModuleNotFound { .. }));
    }

    #[test]
    fn test_module_missing_from_graph() {
        let (_tmp, policy) = setup(&["fan"]);
        let err = expected_modules(&graph(vec![]), &policy, &ModuleRequest::parse("fan"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ModuleNotInGraph { ref dir, .. } if dir == "fan"));
    }

    #[test]
    fn test_library_with_module_name_is_not_a_candidate() {
        let (_tmp, policy) = setup(&["fan"]);
        let graph = graph(vec![
            module_node(policy.root(), "fan", "fan"),
            DependencyNode::new("fan-lib", "/libdeps/fan"),
        ]);
        let expected = expected_modules(&graph, &policy, &ModuleRequest::parse("fan")).unwrap();
        assert_eq!(expected.len(), 1);
        assert_eq!(expected.iter().next().unwrap().library, "fan");
    }

    #[test]
    fn test_ambiguous_module() {
        let (_tmp, policy) = setup(&["fan"]);
        let graph = graph(vec![
            module_node(policy.root(), "fan", "fan"),
            DependencyNode::new("fan-fork", policy.root().join("forks/fan")),
            DependencyNode::new("fan-lib", "/libdeps/fan"),
        ]);
        let err = expected_modules(&graph, &policy, &ModuleRequest::parse("fan")).unwrap_err();
        match err {
            ConfigError::AmbiguousModule { candidates, .. } => {
                assert_eq!(candidates, vec!["fan", "fan-fork"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_incompatible_named_modules_listed_together() {
        let (_tmp, policy) = setup(&["fan", "rotary", "audio"]);
        let graph = graph(vec![
            module_node(policy.root(), "fan", "fan").incompatible(),
            module_node(policy.root(), "rotary", "rotary").incompatible(),
            module_node(policy.root(), "audio", "audio"),
        ]);
        let err = expected_modules(&graph, &policy, &ModuleRequest::parse("fan audio rotary"))
            .unwrap_err();
        match err {
            ConfigError::IncompatibleModules { modules } => {
                assert_eq!(modules, vec!["fan", "rotary"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_filters_incompatible_and_libraries() {
        let (_tmp, policy) = setup(&["fan", "rotary"]);
        let graph = graph(vec![
            module_node(policy.root(), "fan", "fan"),
            module_node(policy.root(), "rotary", "rotary").incompatible(),
            DependencyNode::new("SPI", "/libdeps/SPI"),
        ]);

        let expected = expected_modules(&graph, &policy, &ModuleRequest::All).unwrap();
        assert_eq!(expected.names(), vec!["fan"]);
        assert_eq!(expected.requested(), 1);
    }

    #[test]
    fn test_directory_collision_is_fatal() {
        let modules = vec![
            ExpectedModule::new("a", &DependencyNode::new("a", "/m/a").with_build_dir("/b/1/out")),
            ExpectedModule::new("b", &DependencyNode::new("b", "/m/b").with_build_dir("/b/2/out")),
        ];
        let err = ExpectedModules::new(modules, 2).unwrap_err();
        match err {
            ConfigError::DirectoryCollision { dir_name, modules } => {
                assert_eq!(dir_name, "out");
                assert_eq!(modules, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_library_counted_once() {
        let node = DependencyNode::new("fan", "/m/fan");
        let modules = vec![ExpectedModule::new("fan", &node), ExpectedModule::new("fan_v2", &node)];
        let expected = ExpectedModules::new(modules, 2).unwrap();
        assert_eq!(expected.len(), 1);
        assert_eq!(expected.names(), vec!["fan"]);
    }
}
