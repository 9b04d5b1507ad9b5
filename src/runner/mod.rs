//! Orchestration
//!
//! The trial matrix loop and its scratch-file plumbing.

pub mod evaluator;
pub mod scratch;
