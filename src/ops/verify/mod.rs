//! Link verification against the linker map file.
//!
//! After the final image is linked, every expected module must have placed at
//! least one object file at a non-zero address. The map file is the only
//! evidence the toolchain gives us: an unreferenced module built into an
//! archive is silently dropped by the linker.

mod format;
mod map_file;
mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub use format::{format_human, format_json, registration_warning};
pub use map_file::{object_pattern, MapFile};
pub use types::LinkReport;

use crate::core::dependency::DependencyGraph;
use crate::core::errors::VerifyError;
use crate::core::module::{ModulePolicy, ModuleRequest};
use crate::ops::expected::{expected_modules, ExpectedModules};

/// Section name of the module registration table in the map file.
pub const DEFAULT_REGISTRATION_MARKER: &str = ".dtors.tbl.usermods.1";

/// Check a parsed map file against the expected modules.
///
/// Always returns a report; missing modules are listed in it rather than
/// raised. Use [`LinkReport::ensure_complete`] to turn them into an error.
pub fn verify_link(
    map: &MapFile,
    expected: &ExpectedModules,
    registration_marker: &str,
) -> Result<LinkReport, VerifyError> {
    let registered_count = map.count_marker(registration_marker);
    let confirmed_dirs = map.linked_dirs(expected.dir_names())?;

    let (confirmed, missing): (Vec<_>, Vec<_>) = expected
        .iter()
        .cloned()
        .partition(|module| confirmed_dirs.contains(&module.dir_name));

    tracing::debug!(
        "{} of {} expected modules confirmed, {} registration entries",
        confirmed.len(),
        expected.len(),
        registered_count
    );

    Ok(LinkReport {
        map_file: map.path().map(|p| p.to_path_buf()),
        requested: expected.requested(),
        expected: expected.iter().cloned().collect(),
        confirmed,
        missing,
        registered_count,
    })
}

/// Options for [`verify`].
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Dependency graph exported by the build
    pub graph: PathBuf,
    /// Linker map file of the final image
    pub map_file: PathBuf,
    /// Requested modules
    pub request: ModuleRequest,
    /// Module location and classification
    pub policy: ModulePolicy,
    /// Registration table section name
    pub registration_marker: String,
}

/// Load the graph and map file, then verify the link.
///
/// The map file is checked before anything else so a failed link step is
/// reported as such.
pub fn verify(options: &VerifyOptions) -> Result<LinkReport> {
    if !options.map_file.exists() {
        return Err(VerifyError::MapFileNotFound {
            path: options.map_file.clone(),
        }
        .into());
    }

    let graph = DependencyGraph::load(&options.graph)?;
    let expected = expected_modules(&graph, &options.policy, &options.request)?;
    let map = MapFile::read(&options.map_file)?;

    let report = verify_link(&map, &expected, &options.registration_marker)
        .with_context(|| format!("failed to verify {}", options.map_file.display()))?;
    Ok(report)
}
