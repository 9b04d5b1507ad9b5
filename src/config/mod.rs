//! Configuration
//!
//! Shared types and pre-run validation.

pub mod types;
pub mod validator;
