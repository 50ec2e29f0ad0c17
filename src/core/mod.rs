//! Core data structures for modlink.
//!
//! This module contains the foundational types used throughout modlink:
//! - The dependency graph of the main build
//! - Module classification, location and identity
//! - Configuration and verification errors

pub mod dependency;
pub mod errors;
pub mod module;

pub use dependency::{DependencyGraph, DependencyNode, GraphError, NodeId};
pub use errors::{ConfigError, VerifyError};
pub use module::{ExpectedModule, ModuleClassifier, ModulePolicy, ModuleRequest};
