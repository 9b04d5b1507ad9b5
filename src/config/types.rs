//! Shared types for the evaluation harness

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Input-side sentinel meaning "let the child read the harness's own stdin".
pub const STDIN_SENTINEL: &str = "--";

/// Sentinel for "no file configured" in an input or expected-output list.
pub const NO_FILE: &str = "";

/// Everything one run needs: what to execute, how often, and under what caps.
#[derive(Clone, Debug, Serialize)]
pub struct RunConfig {
    /// Path to the executable under evaluation. Exec'd literally: no shell,
    /// no PATH search.
    pub program: PathBuf,
    /// Arguments passed verbatim. argv[0] is always the program path itself.
    pub args: Vec<String>,
    /// Trials per test case, at least 1
    pub trials: u32,
    /// CPU time limit per trial in seconds (0 = unlimited)
    pub cpu_limit_secs: u64,
    /// Wall clock limit per trial in seconds (0 = unlimited)
    pub wall_limit_secs: u64,
    /// Compare program output against expected files
    pub run_tests: bool,
    /// Collect and report timing
    pub run_timing: bool,
    /// Check every trial's output instead of only the first trial's
    pub compare_every_trial: bool,
    /// Print per-case match/fail lines as checks happen
    pub announce_checks: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::new(),
            args: Vec::new(),
            trials: 1,
            cpu_limit_secs: 0,
            wall_limit_secs: 0,
            run_tests: true,
            run_timing: true,
            compare_every_trial: false,
            announce_checks: true,
        }
    }
}

/// Measured outcome of one trial that ran to a normal exit.
///
/// Built once from the child's reap data and never modified afterwards.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ExecutionResult {
    /// CPU time spent in user mode
    pub user_time: Duration,
    /// CPU time spent in the kernel on the child's behalf
    pub system_time: Duration,
    /// Elapsed wall clock time, fork to reap
    pub wall_time: Duration,
    /// The child's exit code
    pub exit_code: i32,
}

/// Results for one (input, expected output) pair across all its trials.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TrialSet {
    /// Display name for reports: the input path, or a generated case label
    pub label: String,
    /// Input file path; may be [`NO_FILE`] or [`STDIN_SENTINEL`]
    pub input: String,
    /// Expected output file path; may be [`NO_FILE`]
    pub expected: String,
    /// One entry per trial that completed
    pub results: Vec<ExecutionResult>,
    /// Overall checker verdict; `None` when no comparison happened
    pub passed: Option<bool>,
    /// Trials lost to launch failures or fatal signals
    pub errored_trials: u32,
}

/// Errors for the evaluation harness
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not open process: {0}")]
    Launch(String),

    #[error("failed to set time limit: {0}")]
    LimitSetup(String),

    #[error("process killed by signal {signal}")]
    Signaled { signal: i32 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Whether this error is contained to a single trial. Contained errors
    /// are reported and counted; the run moves on to the next trial.
    pub fn is_trial_error(&self) -> bool {
        matches!(
            self,
            EvalError::Launch(_) | EvalError::LimitSetup(_) | EvalError::Signaled { .. }
        )
    }
}

impl From<nix::errno::Errno> for EvalError {
    fn from(err: nix::errno::Errno) -> Self {
        EvalError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
