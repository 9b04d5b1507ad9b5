//! evalbox: runs a program across test-case files, timing every trial and
//! grading its output against expected results.
//!
//! # Architecture
//!
//! Data flows one way: discovery builds the case list, the evaluator runs
//! the trial matrix through the execution core, and the reports render
//! whatever came back.
//!
//! ## Execution core ([`exec`])
//! - [`exec::launcher`]: fork, stdio redirection, CPU cap, exec
//! - [`exec::limiter`]: wall-clock cap and per-trial rusage measurement
//! - [`exec::relay`]: forwards termination signals to the running child
//!
//! ## Orchestration ([`runner`])
//! - [`runner::evaluator`]: the trial matrix loop with failure containment
//! - [`runner::scratch`]: self-removing scratch files
//!
//! ## Grading and reporting
//! - [`check::checker`]: output comparison with ignore rules
//! - [`report::timer`]: trial/average timing tables
//! - [`report::json`]: machine-readable run summary
//!
//! ## Supporting
//! - [`discovery`]: test-case discovery by filename suffix
//! - [`config`]: shared types and pre-run validation
//! - [`cli`]: command line front end

// Execution core
pub mod exec;

// Orchestration
pub mod runner;

// Grading and reporting
pub mod check;
pub mod report;

// Supporting
pub mod config;
pub mod discovery;

// CLI wiring for the evalbox binary
pub mod cli;

// Re-export the shared types for convenience
pub use config::types::*;
