//! Configuration file support for modlink.
//!
//! modlink supports two configuration file locations:
//! - Global: `<config dir>/modlink/config.toml` - User-wide defaults
//! - Project: `Modlink.toml` - Found by walking up from the current directory
//!
//! Project config takes precedence over global config. Relative paths in the
//! project config are resolved against the directory holding `Modlink.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::module::{ModulePolicy, ModuleRequest, DEFAULT_MANIFEST};
use crate::ops::verify::DEFAULT_REGISTRATION_MARKER;

/// Project configuration file name.
pub const PROJECT_CONFIG_NAME: &str = "Modlink.toml";

/// modlink configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Main project settings
    pub project: ProjectConfig,

    /// Module settings
    pub modules: ModulesConfig,

    /// Build output settings
    pub build: BuildConfig,

    /// Link verification settings
    pub verify: VerifyConfig,
}

/// Main project settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Source root of the main project (default: `src`)
    pub src_dir: Option<PathBuf>,
}

/// Module settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Directory holding module sources (default: `modules`)
    pub dir: Option<PathBuf>,

    /// Library name prefix that also marks a module
    pub name_prefix: Option<String>,

    /// Manifest file marking a module directory (default: `library.json`)
    pub manifest: Option<String>,

    /// Directory patterns tried when locating a module, with `{name}`
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Requested modules, whitespace separated or `*`
    pub request: Option<String>,
}

/// Build output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Dependency graph file (default: `<build_dir>/deps.toml`)
    pub graph: Option<PathBuf>,

    /// Build output directory (default: `build`)
    pub build_dir: Option<PathBuf>,

    /// Program name; the map file is `<build_dir>/<program>.map` (default: `firmware`)
    pub program: Option<String>,
}

/// Link verification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Section name of the registration table (default: `.dtors.tbl.usermods.1`)
    pub registration_marker: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.project.src_dir.is_some() {
            self.project.src_dir = other.project.src_dir;
        }

        if other.modules.dir.is_some() {
            self.modules.dir = other.modules.dir;
        }
        if other.modules.name_prefix.is_some() {
            self.modules.name_prefix = other.modules.name_prefix;
        }
        if other.modules.manifest.is_some() {
            self.modules.manifest = other.modules.manifest;
        }
        if !other.modules.patterns.is_empty() {
            self.modules.patterns = other.modules.patterns;
        }
        if other.modules.request.is_some() {
            self.modules.request = other.modules.request;
        }

        if other.build.graph.is_some() {
            self.build.graph = other.build.graph;
        }
        if other.build.build_dir.is_some() {
            self.build.build_dir = other.build.build_dir;
        }
        if other.build.program.is_some() {
            self.build.program = other.build.program;
        }

        if other.verify.registration_marker.is_some() {
            self.verify.registration_marker = other.verify.registration_marker;
        }
    }

    /// Project source root, relative to the project root.
    pub fn src_dir(&self) -> PathBuf {
        self.project
            .src_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("src"))
    }

    /// Modules directory, relative to the project root.
    pub fn modules_dir(&self) -> PathBuf {
        self.modules
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("modules"))
    }

    /// Build output directory, relative to the project root.
    pub fn build_dir(&self) -> PathBuf {
        self.build
            .build_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("build"))
    }

    /// Dependency graph file, relative to the project root.
    pub fn graph(&self) -> PathBuf {
        self.build
            .graph
            .clone()
            .unwrap_or_else(|| self.build_dir().join("deps.toml"))
    }

    pub fn program(&self) -> &str {
        self.build.program.as_deref().unwrap_or("firmware")
    }

    /// Map file written by the linker, relative to the project root.
    pub fn map_file(&self) -> PathBuf {
        self.build_dir().join(format!("{}.map", self.program()))
    }

    pub fn registration_marker(&self) -> &str {
        self.verify
            .registration_marker
            .as_deref()
            .unwrap_or(DEFAULT_REGISTRATION_MARKER)
    }

    /// Parsed module request; nothing requested when unset.
    pub fn request(&self) -> ModuleRequest {
        ModuleRequest::parse(self.modules.request.as_deref().unwrap_or(""))
    }

    /// Module policy rooted at `modules_root`.
    pub fn module_policy(&self, modules_root: PathBuf) -> ModulePolicy {
        let mut policy = ModulePolicy::new(modules_root)
            .with_patterns(self.modules.patterns.clone())
            .with_manifest(self.modules.manifest.as_deref().unwrap_or(DEFAULT_MANIFEST));
        if let Some(prefix) = &self.modules.name_prefix {
            policy = policy.with_name_prefix(prefix.clone());
        }
        policy
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (Modlink.toml)
/// 2. Global config (<config dir>/modlink/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global modlink config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "modlink").map(|dirs| dirs.config_dir().to_path_buf())
}
