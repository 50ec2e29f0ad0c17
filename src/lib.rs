//! modlink - include resolution and link verification for optional firmware modules
//!
//! This crate provides the core library functionality for modlink: resolving
//! the include search path of every module against the build's dependency
//! graph, and proving from the linker map file that every requested module
//! made it into the final image.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for modlink unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides dependency graph builders and linker map
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    DependencyGraph, DependencyNode, ExpectedModule, ModuleClassifier, ModulePolicy,
    ModuleRequest,
};

pub use builder::IncludeSet;
pub use ops::{ExpectedModules, LinkReport};
pub use util::context::GlobalContext;
