//! Trial orchestration
//!
//! Runs every (input, expected output) pair for the configured number of
//! trials, checking output as it goes. A failed trial is reported and
//! counted; it never stops the rest of the matrix.

use crate::check::checker::OutputChecker;
use crate::config::types::{Result, RunConfig, TrialSet, NO_FILE, STDIN_SENTINEL};
use crate::config::validator;
use crate::exec::launcher::{LaunchSpec, Redirect};
use crate::exec::limiter::{Limiter, Limits};
use crate::exec::relay::SignalRelay;
use crate::runner::scratch::ScratchFile;
use log::debug;
use std::path::{Path, PathBuf};

/// Drives a full run: the trial matrix, output checks, failure containment.
pub struct Evaluator<'r> {
    config: RunConfig,
    checker: OutputChecker,
    relay: &'r SignalRelay,
}

impl<'r> Evaluator<'r> {
    pub fn new(config: RunConfig, checker: OutputChecker, relay: &'r SignalRelay) -> Self {
        Self {
            config,
            checker,
            relay,
        }
    }

    /// Run the whole matrix in order: every trial of pair 0, then every
    /// trial of pair 1, and so on.
    ///
    /// Each trial reads its input per the pair's entry ([`NO_FILE`] gets an
    /// empty scratch file, [`STDIN_SENTINEL`] inherits the harness's stdin)
    /// and writes stdout to a scratch file that the checker reads back.
    /// stderr stays on the harness's own stream. Launch failures and fatal
    /// signals are contained to their trial; anything else aborts the run.
    pub fn run(&self, inputs: &[String], outputs: &[String]) -> Result<Vec<TrialSet>> {
        validator::validate_config(&self.config)?;
        validator::validate_matrix(inputs, outputs)?;

        let empty_input = ScratchFile::create("in")?;
        let output_buffer = ScratchFile::create("out")?;
        let limiter = Limiter::new(
            self.relay,
            Limits {
                cpu_secs: self.config.cpu_limit_secs,
                wall_secs: self.config.wall_limit_secs,
            },
        );

        let mut sets = Vec::with_capacity(inputs.len());
        for (case, (input, expected)) in inputs.iter().zip(outputs.iter()).enumerate() {
            let mut set = TrialSet {
                label: case_label(case, input),
                input: input.clone(),
                expected: expected.clone(),
                ..Default::default()
            };
            let spec = LaunchSpec {
                program: self.config.program.clone(),
                args: self.config.args.clone(),
                stdin: stdin_redirect(input, empty_input.path()),
                stdout: Redirect::WritePath(output_buffer.path().to_path_buf()),
                stderr: Redirect::Inherit,
            };

            for trial in 0..self.config.trials {
                match limiter.run(&spec) {
                    Ok(result) => {
                        debug!(
                            "{} trial {}: exit code {}, wall {:?}",
                            set.label, trial, result.exit_code, result.wall_time
                        );
                        set.results.push(result);
                        if self.config.run_tests && self.checks_this_trial(trial) {
                            self.check_output(&mut set, output_buffer.path());
                        }
                    }
                    Err(err) if err.is_trial_error() => {
                        eprintln!(
                            "Error: {} ({}, trial {} of {})",
                            err,
                            set.label,
                            trial + 1,
                            self.config.trials
                        );
                        set.errored_trials += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
            sets.push(set);
        }
        Ok(sets)
    }

    /// The first trial of each pair is always checked; later trials only
    /// when configured, since repeat runs exist for timing.
    fn checks_this_trial(&self, trial: u32) -> bool {
        trial == 0 || self.config.compare_every_trial
    }

    fn check_output(&self, set: &mut TrialSet, actual: &Path) {
        let comparison = self.checker.compare(&set.expected, actual);
        set.passed = Some(set.passed.unwrap_or(true) && comparison.passed);
        if !self.config.announce_checks {
            return;
        }
        if comparison.passed {
            let expected = match set.expected.as_str() {
                NO_FILE => "empty output",
                path => path,
            };
            println!("Output from {} matches {}", set.label, expected);
        } else {
            println!("Output from {} failed", set.label);
            if let Some(detail) = comparison.detail {
                println!("  {detail}");
            }
        }
    }
}

fn case_label(index: usize, input: &str) -> String {
    match input {
        NO_FILE => format!("case {}", index + 1),
        STDIN_SENTINEL => format!("case {} (stdin)", index + 1),
        path => path.to_string(),
    }
}

fn stdin_redirect(input: &str, empty_input: &Path) -> Redirect {
    match input {
        NO_FILE => Redirect::ReadPath(empty_input.to_path_buf()),
        STDIN_SENTINEL => Redirect::Inherit,
        path => Redirect::ReadPath(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::EvalError;

    fn quiet_config(program: &str, trials: u32) -> RunConfig {
        RunConfig {
            program: PathBuf::from(program),
            trials,
            run_tests: false,
            announce_checks: false,
            ..Default::default()
        }
    }

    #[test]
    fn labels_name_files_or_fall_back_to_case_numbers() {
        assert_eq!(case_label(0, "tests/a.in"), "tests/a.in");
        assert_eq!(case_label(1, ""), "case 2");
        assert_eq!(case_label(2, "--"), "case 3 (stdin)");
    }

    #[test]
    fn empty_input_redirects_to_the_empty_scratch() {
        let scratch = Path::new("/tmp/empty");
        match stdin_redirect("", scratch) {
            Redirect::ReadPath(path) => assert_eq!(path, scratch),
            other => panic!("expected a read redirect, got {other:?}"),
        }
    }

    #[test]
    fn stdin_sentinel_inherits() {
        assert!(matches!(
            stdin_redirect("--", Path::new("/tmp/empty")),
            Redirect::Inherit
        ));
    }

    #[test]
    fn runs_every_trial_of_every_pair() {
        let _lock = crate::exec::relay::test_support::relay_lock();
        let relay = SignalRelay::install().expect("install relay");
        let evaluator = Evaluator::new(quiet_config("/bin/true", 3), OutputChecker::new(), &relay);
        let inputs = vec![String::new(), String::new()];
        let outputs = vec![String::new(), String::new()];
        let sets = evaluator.run(&inputs, &outputs).expect("matrix runs");
        assert_eq!(sets.len(), 2);
        for set in &sets {
            assert_eq!(set.results.len(), 3);
            assert_eq!(set.errored_trials, 0);
            assert!(set.results.iter().all(|r| r.exit_code == 0));
        }
    }

    #[test]
    fn launch_failures_are_counted_not_fatal() {
        let _lock = crate::exec::relay::test_support::relay_lock();
        let relay = SignalRelay::install().expect("install relay");
        let evaluator = Evaluator::new(
            quiet_config("/no/such/binary", 2),
            OutputChecker::new(),
            &relay,
        );
        let inputs = vec![String::new()];
        let outputs = vec![String::new()];
        let sets = evaluator.run(&inputs, &outputs).expect("run completes");
        assert_eq!(sets[0].results.len(), 0);
        assert_eq!(sets[0].errored_trials, 2);
        assert_eq!(sets[0].passed, None);
    }

    #[test]
    fn uneven_matrix_aborts_before_any_launch() {
        let relay = SignalRelay::install().expect("install relay");
        let evaluator = Evaluator::new(quiet_config("/bin/true", 1), OutputChecker::new(), &relay);
        let inputs = vec![String::new(), String::new()];
        let outputs = vec![String::new()];
        assert!(matches!(
            evaluator.run(&inputs, &outputs),
            Err(EvalError::Config(_))
        ));
    }

    #[test]
    fn matching_output_marks_the_pair_passed() {
        let _lock = crate::exec::relay::test_support::relay_lock();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("case.in");
        let expected = dir.path().join("case.out");
        std::fs::write(&input, "hello\n").unwrap();
        std::fs::write(&expected, "hello\n").unwrap();

        let relay = SignalRelay::install().expect("install relay");
        let mut config = quiet_config("/bin/cat", 1);
        config.run_tests = true;
        let evaluator = Evaluator::new(config, OutputChecker::new(), &relay);
        let inputs = vec![input.to_string_lossy().into_owned()];
        let outputs = vec![expected.to_string_lossy().into_owned()];
        let sets = evaluator.run(&inputs, &outputs).expect("run completes");
        assert_eq!(sets[0].passed, Some(true));
    }

    #[test]
    fn mismatched_output_marks_the_pair_failed() {
        let _lock = crate::exec::relay::test_support::relay_lock();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("case.in");
        let expected = dir.path().join("case.out");
        std::fs::write(&input, "hello\n").unwrap();
        std::fs::write(&expected, "goodbye\n").unwrap();

        let relay = SignalRelay::install().expect("install relay");
        let mut config = quiet_config("/bin/cat", 1);
        config.run_tests = true;
        let evaluator = Evaluator::new(config, OutputChecker::new(), &relay);
        let inputs = vec![input.to_string_lossy().into_owned()];
        let outputs = vec![expected.to_string_lossy().into_owned()];
        let sets = evaluator.run(&inputs, &outputs).expect("run completes");
        assert_eq!(sets[0].passed, Some(false));
    }
}
