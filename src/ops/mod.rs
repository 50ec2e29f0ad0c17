//! High-level operations.
//!
//! This module contains the implementation of modlink commands.

pub mod expected;
pub mod includes;
pub mod verify;

pub use expected::{expected_modules, ExpectedModules};
pub use includes::{includes, IncludesOptions};
pub use verify::{verify, verify_link, LinkReport, MapFile, VerifyOptions};
