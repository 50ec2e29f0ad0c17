//! Public types for link verification.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::errors::VerifyError;
use crate::core::module::ExpectedModule;

/// Outcome of checking one map file.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    /// Map file that was scanned, if it came from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_file: Option<PathBuf>,

    /// Number of distinct modules requested
    pub requested: usize,

    /// Modules the image must contain
    pub expected: Vec<ExpectedModule>,

    /// Modules with at least one placed object file
    pub confirmed: Vec<ExpectedModule>,

    /// Modules with no placed object file
    pub missing: Vec<ExpectedModule>,

    /// Lines in the registration table section
    pub registered_count: usize,
}

impl LinkReport {
    /// Whether every expected module made it into the image.
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }

    /// Fail with every missing module named.
    pub fn ensure_complete(&self) -> Result<(), VerifyError> {
        if self.passed() {
            Ok(())
        } else {
            Err(VerifyError::MissingModules {
                modules: self.missing.clone(),
            })
        }
    }
}
