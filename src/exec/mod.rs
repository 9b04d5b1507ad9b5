//! Execution core
//!
//! Launching, limiting, and signal relay for one child process at a time.

pub mod launcher;
pub mod limiter;
pub mod relay;
