//! Compilation-unit setup for modules.
//!
//! This module computes the include search paths modules are compiled with.

pub mod include_resolver;

pub use include_resolver::{
    resolve_includes, resolve_module_includes, IncludeResolution, IncludeSet, ModuleIncludes,
};
