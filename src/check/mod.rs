//! Grading
//!
//! Output comparison with configurable ignore rules.

pub mod checker;
