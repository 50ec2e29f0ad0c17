//! Global context for modlink operations.
//!
//! Provides centralized access to configuration, paths, and environment.
//! Paths from configuration are relative to the project root: the directory
//! holding `Modlink.toml`, or the working directory when there is none.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::module::ModulePolicy;
use crate::util::config::{global_config_dir, load_config, Config, PROJECT_CONFIG_NAME};
use crate::util::fs::{find_upwards, resolve_against};

/// Environment variable overriding the global config directory.
pub const HOME_ENV: &str = "MODLINK_HOME";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Directory holding the global config file
    home: PathBuf,

    /// Directory holding Modlink.toml, if one was found
    project_root: Option<PathBuf>,

    /// Merged global and project configuration
    config: Config,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a context for the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_cwd(cwd)
    }

    /// Create a context rooted at a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let home = match std::env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => global_config_dir().unwrap_or_else(|| cwd.join(".modlink")),
        };

        let project_root = find_upwards(&cwd, PROJECT_CONFIG_NAME)
            .and_then(|manifest| manifest.parent().map(Path::to_path_buf));

        let mut ctx = GlobalContext {
            cwd,
            home,
            project_root,
            config: Config::default(),
            verbose: false,
        };
        ctx.config = load_config(&ctx.config_path(), &ctx.project_config_path());
        tracing::debug!(
            "project root: {}",
            ctx.project_root
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".to_string())
        );
        Ok(ctx)
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global config directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Directory holding Modlink.toml, if any.
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Base directory for relative configuration paths.
    pub fn root(&self) -> &Path {
        self.project_root.as_deref().unwrap_or(&self.cwd)
    }

    /// Path of the project configuration file, whether or not it exists.
    pub fn project_config_path(&self) -> PathBuf {
        self.root().join(PROJECT_CONFIG_NAME)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_against(self.root(), path)
    }

    /// Resolve a command-line path against the working directory.
    pub fn resolve_arg(&self, path: &Path) -> PathBuf {
        resolve_against(&self.cwd, path)
    }

    /// Dependency graph file.
    pub fn graph_path(&self) -> PathBuf {
        self.resolve(&self.config.graph())
    }

    /// Linker map file of the final image.
    pub fn map_file(&self) -> PathBuf {
        self.resolve(&self.config.map_file())
    }

    /// Source root of the main project.
    pub fn project_src(&self) -> PathBuf {
        self.resolve(&self.config.src_dir())
    }

    /// Module policy rooted at the configured modules directory.
    pub fn module_policy(&self) -> ModulePolicy {
        self.config
            .module_policy(self.resolve(&self.config.modules_dir()))
    }
}
