//! Execution engine module.
//!
//! This module runs node invocations against a registry.

pub mod engine;

pub use engine::{ExecutionEngine, ExecutionOptions, NodeInputs, NodeOutputs};
