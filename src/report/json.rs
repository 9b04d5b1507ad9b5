//! JSON report
//!
//! Machine-readable summary of a whole run, for scripts that wrap the
//! harness. Times are flattened to seconds as floats.

use crate::config::types::{EvalError, Result, RunConfig, TrialSet};
use serde::Serialize;

/// Bumped when the shape of the report changes.
const REPORT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub version: u32,
    pub program: String,
    pub config: &'a RunConfig,
    pub cases: Vec<JsonCase>,
    pub summary: JsonSummary,
}

#[derive(Debug, Serialize)]
pub struct JsonCase {
    pub label: String,
    pub input: String,
    pub expected: String,
    /// Checker verdict; null when no comparison happened
    pub passed: Option<bool>,
    pub errored_trials: u32,
    pub trials: Vec<JsonTrial>,
}

#[derive(Debug, Serialize)]
pub struct JsonTrial {
    pub wall_s: f64,
    pub user_s: f64,
    pub system_s: f64,
    pub exit_code: i32,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored_trials: u32,
    pub trials_run: usize,
}

impl<'a> JsonReport<'a> {
    pub fn build(config: &'a RunConfig, sets: &[TrialSet]) -> Self {
        let cases: Vec<JsonCase> = sets
            .iter()
            .map(|set| JsonCase {
                label: set.label.clone(),
                input: set.input.clone(),
                expected: set.expected.clone(),
                passed: set.passed,
                errored_trials: set.errored_trials,
                trials: set
                    .results
                    .iter()
                    .map(|r| JsonTrial {
                        wall_s: r.wall_time.as_secs_f64(),
                        user_s: r.user_time.as_secs_f64(),
                        system_s: r.system_time.as_secs_f64(),
                        exit_code: r.exit_code,
                    })
                    .collect(),
            })
            .collect();

        let summary = JsonSummary {
            cases: sets.len(),
            passed: sets.iter().filter(|s| s.passed == Some(true)).count(),
            failed: sets.iter().filter(|s| s.passed == Some(false)).count(),
            errored_trials: sets.iter().map(|s| s.errored_trials).sum(),
            trials_run: sets.iter().map(|s| s.results.len()).sum(),
        };

        Self {
            version: REPORT_VERSION,
            program: config.program.display().to_string(),
            config,
            cases,
            summary,
        }
    }

    pub fn to_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EvalError::Internal(format!("could not serialize report: {e}")))
    }
}
