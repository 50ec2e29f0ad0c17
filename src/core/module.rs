//! Optional firmware modules: classification, location and identity.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::core::dependency::DependencyNode;
use crate::core::errors::ConfigError;

/// Default directory patterns tried when locating a requested module.
pub const DEFAULT_PATTERNS: &[&str] = &["{name}", "{name}_v2", "usermod_v2_{name}"];

/// Default manifest file that marks a directory as a module.
pub const DEFAULT_MANIFEST: &str = "library.json";

/// Decides whether a dependency is an optional module.
///
/// Traversals take this as a policy so classification rules can change
/// without touching them.
pub trait ModuleClassifier {
    fn is_module(&self, node: &DependencyNode) -> bool;
}

impl<F> ModuleClassifier for F
where
    F: Fn(&DependencyNode) -> bool,
{
    fn is_module(&self, node: &DependencyNode) -> bool {
        self(node)
    }
}

/// Where modules live and how they are recognized.
#[derive(Debug, Clone)]
pub struct ModulePolicy {
    root: PathBuf,
    name_prefix: Option<String>,
    patterns: Vec<String>,
    manifest: String,
}

impl ModulePolicy {
    /// Policy for modules stored under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ModulePolicy {
            root: root.into(),
            name_prefix: None,
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            manifest: DEFAULT_MANIFEST.to_string(),
        }
    }

    /// Also classify libraries whose name starts with `prefix` as modules.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.name_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Replace the directory patterns used by [`ModulePolicy::locate`].
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    /// Manifest file name used by [`ModulePolicy::discover`].
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    /// The modules root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the directory holding the requested module.
    ///
    /// Candidates are tried in pattern order; the first existing one wins.
    pub fn locate(&self, name: &str) -> Result<PathBuf, ConfigError> {
        self.patterns
            .iter()
            .map(|pattern| self.root.join(pattern.replace("{name}", name)))
            .find(|candidate| candidate.is_dir())
            .ok_or_else(|| ConfigError::ModuleNotFound {
                name: name.to_string(),
                root: self.root.clone(),
            })
    }

    /// Names of every module directory under the root that carries a manifest,
    /// sorted.
    pub fn discover(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.path().join(&self.manifest).is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl ModuleClassifier for ModulePolicy {
    fn is_module(&self, node: &DependencyNode) -> bool {
        let under_root = node.src_dir != self.root && node.src_dir.starts_with(&self.root);
        let prefixed = self
            .name_prefix
            .as_deref()
            .is_some_and(|prefix| node.name.starts_with(prefix));
        under_root || prefixed
    }
}

/// Which modules the project asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleRequest {
    /// Every module known to the build
    All,
    /// An explicit list, duplicates removed, first occurrence kept
    Named(Vec<String>),
}

impl ModuleRequest {
    /// Parse a whitespace separated list, where `*` alone means every module.
    pub fn parse(list: &str) -> Self {
        if list.trim() == "*" {
            return ModuleRequest::All;
        }
        Self::from_names(list.split_whitespace())
    }

    /// Build an explicit request, dropping repeated names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name == "*" {
                return ModuleRequest::All;
            }
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        ModuleRequest::Named(unique)
    }

    /// Check if nothing was requested.
    pub fn is_empty(&self) -> bool {
        matches!(self, ModuleRequest::Named(names) if names.is_empty())
    }
}

impl fmt::Display for ModuleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleRequest::All => write!(f, "*"),
            ModuleRequest::Named(names) => write!(f, "{}", names.join(" ")),
        }
    }
}

/// A module the linked binary must contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExpectedModule {
    /// Name as requested by the project
    pub name: String,
    /// Library name in the dependency graph
    pub library: String,
    /// Base name of the build-output directory
    pub dir_name: String,
}

impl ExpectedModule {
    pub fn new(name: impl Into<String>, node: &DependencyNode) -> Self {
        ExpectedModule {
            name: name.into(),
            library: node.name.clone(),
            dir_name: node.output_dir_name(),
        }
    }
}

impl fmt::Display for ExpectedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.dir_name {
            write!(f, "`{}`", self.name)
        } else {
            write!(f, "`{}` (build dir `{}`)", self.name, self.dir_name)
        }
    }
}
