//! Reporting
//!
//! Human-readable timing tables and the machine-readable JSON summary.

pub mod json;
pub mod timer;
