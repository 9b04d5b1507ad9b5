//! Pre-run validation
//!
//! Fails fast with actionable errors before any process is spawned.

use crate::config::types::{EvalError, Result, RunConfig, STDIN_SENTINEL};

/// Check a [`RunConfig`] before the first trial.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.program.as_os_str().is_empty() {
        return Err(EvalError::Config("no program specified".to_string()));
    }
    if config.trials == 0 {
        return Err(EvalError::Config(
            "trial count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Check that the input and expected-output lists form a usable matrix.
///
/// The lists must be the same length; pairing is positional. The stdin
/// sentinel only makes sense on the input side.
pub fn validate_matrix(inputs: &[String], outputs: &[String]) -> Result<()> {
    if inputs.len() != outputs.len() {
        return Err(EvalError::Config(format!(
            "differing amounts of inputs and outputs ({} vs {})",
            inputs.len(),
            outputs.len()
        )));
    }
    if outputs.iter().any(|o| o == STDIN_SENTINEL) {
        return Err(EvalError::Config(format!(
            "'{STDIN_SENTINEL}' is only meaningful as an input"
        )));
    }
    Ok(())
}
