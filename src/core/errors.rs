//! Configuration and verification errors.
//!
//! Both families are fatal: they describe a build configuration defect the
//! user has to fix, so they always name every offending module at once.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::module::ExpectedModule;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A module selection that cannot be built correctly.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigError {
    #[error("couldn't locate module `{name}` in modules directory `{}`", .root.display())]
    #[diagnostic(code(modlink::config::module_not_found))]
    ModuleNotFound { name: String, root: PathBuf },

    #[error("module `{name}` (directory `{dir}`) not found in library builders")]
    #[diagnostic(code(modlink::config::module_not_in_graph))]
    ModuleNotInGraph { name: String, dir: String },

    #[error("module `{name}` matches more than one library with directory `{dir}`")]
    #[diagnostic(code(modlink::config::ambiguous_module))]
    AmbiguousModule {
        name: String,
        dir: String,
        candidates: Vec<String>,
    },

    #[error("module(s) {} are not compatible with this platform", .modules.join(", "))]
    #[diagnostic(code(modlink::config::incompatible))]
    IncompatibleModules { modules: Vec<String> },

    #[error("module(s) {} are built as static archives and will not link in correctly", .modules.join(" "))]
    #[diagnostic(
        code(modlink::config::archived_module),
        help("set libArchive = false on every module")
    )]
    ArchivedModules { modules: Vec<String> },

    #[error("modules {} share the build directory name `{dir_name}`", .modules.join(", "))]
    #[diagnostic(code(modlink::config::dir_collision))]
    DirectoryCollision {
        dir_name: String,
        modules: Vec<String>,
    },
}

impl ConfigError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ConfigError::ModuleNotFound { name, root } => diag
                .with_context(format!(
                    "tried `{name}`, `{name}_v2` and `usermod_v2_{name}` under {}",
                    root.display()
                ))
                .with_suggestion("Check the module name in the module list")
                .with_suggestion("Set [modules] dir in Modlink.toml if modules live elsewhere"),
            ConfigError::ModuleNotInGraph { name, .. } => diag.with_suggestion(format!(
                "Add `{}` to the build's library dependencies before linking",
                name
            )),
            ConfigError::AmbiguousModule { candidates, .. } => diag
                .with_context(format!("candidates: {}", candidates.join(", ")))
                .with_suggestion("Rename one of the module directories"),
            ConfigError::IncompatibleModules { modules } => {
                let mut diag = diag;
                for module in modules {
                    diag = diag.with_context(format!("`{}` does not support this platform", module));
                }
                diag.with_suggestion("Remove the modules from the module list for this environment")
            }
            ConfigError::ArchivedModules { modules } => {
                let mut diag = diag;
                for module in modules {
                    diag = diag.with_context(format!("`{}` has archiving enabled", module));
                }
                diag.with_suggestion(suggestions::ARCHIVED_MODULE)
            }
            ConfigError::DirectoryCollision { modules, .. } => diag
                .with_context("map file evidence cannot tell these modules apart")
                .with_suggestion(format!(
                    "Rename the directory of one of: {}",
                    modules.join(", ")
                )),
        }
    }
}

/// The linked binary does not match the module selection.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum VerifyError {
    #[error("map file not found: {}", .path.display())]
    #[diagnostic(code(modlink::verify::no_map_file))]
    MapFileNotFound { path: PathBuf },

    #[error("failed to read map file `{}`", .path.display())]
    #[diagnostic(code(modlink::verify::io))]
    MapFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build object path pattern")]
    #[diagnostic(code(modlink::verify::pattern))]
    Pattern(#[from] regex::Error),

    #[error("no object files from {} found in linked output", missing_names(.modules))]
    #[diagnostic(code(modlink::verify::missing_modules))]
    MissingModules { modules: Vec<ExpectedModule> },
}

fn missing_names(modules: &[ExpectedModule]) -> String {
    modules
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl VerifyError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            VerifyError::MapFileNotFound { path } => diag
                .with_location(path)
                .with_suggestion(suggestions::NO_MAP_FILE),
            VerifyError::MapFileUnreadable { path, source } => {
                diag.with_location(path).with_context(source.to_string())
            }
            VerifyError::Pattern(source) => diag.with_context(source.to_string()),
            VerifyError::MissingModules { modules } => {
                let mut diag = diag;
                for module in modules {
                    diag = diag.with_context(module.to_string());
                }
                diag.with_suggestion(suggestions::MISSING_MODULE)
            }
        }
    }
}
